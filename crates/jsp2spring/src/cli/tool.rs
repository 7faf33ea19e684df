//! `tool` command: run one storage tool by name

use crate::cli::error::HelpfulError;
use crate::cli::output::{format_size, print_json, print_table};
use jsp2spring_core::{invoke, EngineError, FsStorage, ToolKind, ToolOutput, ToolRequest};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug)]
pub struct ToolArgs {
    pub name: Option<String>,
    pub path: Option<PathBuf>,
    pub content: Option<String>,
    pub list: bool,
    pub json: bool,
}

#[derive(Serialize)]
struct ToolInfo {
    name: &'static str,
    description: &'static str,
}

pub fn run(args: ToolArgs) -> anyhow::Result<()> {
    if args.list {
        return list_tools(args.json);
    }

    let Some(name) = args.name else {
        return Err(HelpfulError::new("No tool name given")
            .with_suggestions([
                "TRY: List tools: jsp2spring tool --list",
                "TRY: Read a file: jsp2spring tool read_file <path>",
            ])
            .into());
    };
    let kind = ToolKind::lookup(&name).map_err(|err| match err {
        EngineError::UnknownTool { name, available } => HelpfulError::unknown_tool(&name, &available),
        other => HelpfulError::new(other.to_string()),
    })?;
    let Some(path) = args.path else {
        return Err(HelpfulError::new(format!("{} needs a path", kind.name()))
            .with_suggestion(format!("TRY: jsp2spring tool {} <path>", kind.name()))
            .into());
    };

    let request = ToolRequest {
        path: path.clone(),
        content: args.content,
    };
    let output = invoke(&FsStorage::new(), kind, &request)
        .map_err(|e| HelpfulError::from_engine(e, &path))?;

    if args.json {
        return print_json(&output);
    }
    match output {
        ToolOutput::Entries { entries } => {
            let rows = entries
                .into_iter()
                .map(|e| {
                    let size = if e.is_dir { "-".to_string() } else { format_size(e.size) };
                    let name = if e.is_dir { format!("{}/", e.name) } else { e.name };
                    vec![name, size]
                })
                .collect();
            print_table(&["Name", "Size"], rows);
        }
        ToolOutput::Text { content } => print!("{}", content),
        ToolOutput::Written { path, bytes } => println!("Wrote {} to {}", format_size(bytes as u64), path),
    }
    Ok(())
}

fn list_tools(json: bool) -> anyhow::Result<()> {
    let tools: Vec<ToolInfo> = ToolKind::ALL
        .iter()
        .map(|k| ToolInfo {
            name: k.name(),
            description: k.description(),
        })
        .collect();
    if json {
        return print_json(&tools);
    }
    let rows = tools
        .iter()
        .map(|t| vec![t.name.to_string(), t.description.to_string()])
        .collect();
    print_table(&["Tool", "Description"], rows);
    Ok(())
}
