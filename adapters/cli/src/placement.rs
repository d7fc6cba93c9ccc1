//! Parsing of `--place` arguments.

use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use code_defence_core::{CellCoord, ToolKind};

/// Unit placement requested on the command line as `<tool>@<row>,<col>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) tool: ToolKind,
    pub(crate) cell: CellCoord,
}

impl FromStr for Placement {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        let (tool, position) = value
            .split_once('@')
            .ok_or_else(|| anyhow!("placement `{value}` must look like <tool>@<row>,<col>"))?;
        let tool: ToolKind = tool
            .parse()
            .with_context(|| format!("placement `{value}` names an unknown tool"))?;
        let (row, column) = position
            .split_once(',')
            .ok_or_else(|| anyhow!("placement `{value}` is missing the column"))?;
        let row: u32 = row
            .trim()
            .parse()
            .with_context(|| format!("invalid row in placement `{value}`"))?;
        let column: u32 = column
            .trim()
            .parse()
            .with_context(|| format!("invalid column in placement `{value}`"))?;

        Ok(Self {
            tool,
            cell: CellCoord::new(column, row),
        })
    }
}
