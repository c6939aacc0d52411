//! Minimal CLI: edit script | field tree → schema.json
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::field::{ArrayItemType, FieldNode, FieldType};
use crate::schema::EXPORT_FILE_NAME;
use crate::session::{EditEvent, EditSession, SessionConfig};
use crate::tree::{DuplicateKey, EmptyGroupPolicy, FieldTree};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// build a JSON schema from field edits and export it as schema.json
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    /// more log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// replay edit scripts against a fresh session and emit the resulting schema
    Replay(ReplayOut),
    /// compile a field tree document directly
    Compile(CompileOut),
    /// list the field types and array item types an editor offers
    Types,
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug, Clone)]
struct OutputSettings {
    /// directory to export schema.json into (stdout if omitted)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// debugging
    #[arg(long)]
    no_op: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    /// put one default child back into an emptied nested group
    Reseed,
    /// refuse to remove the last child of a nested group
    Reject,
}

#[derive(clap::Parser, Debug)]
struct ReplayOut {
    #[command(flatten)]
    input_settings: InputSettings,

    #[command(flatten)]
    output: OutputSettings,

    /// what removing the last child of a nested group does
    #[arg(long, value_enum, default_value_t = PolicyArg::Reseed)]
    empty_group_policy: PolicyArg,

    /// start from an empty root list instead of one default row
    #[arg(long)]
    no_seed_row: bool,

    /// log refused edits and carry on instead of stopping at the first one
    #[arg(long)]
    keep_going: bool,
}

#[derive(clap::Parser, Debug)]
struct CompileOut {
    /// field tree JSON file (an array of fields)
    #[arg(short, long)]
    input: PathBuf,

    #[command(flatten)]
    output: OutputSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl From<PolicyArg> for EmptyGroupPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Reseed => EmptyGroupPolicy::Reseed,
            PolicyArg::Reject => EmptyGroupPolicy::Reject,
        }
    }
}

impl InputSettings {
    fn load_events(&self) -> Result<Vec<EditEvent>> {
        let source_paths = resolve_file_path_patterns(&self.input)
            .context("failed to resolve input file paths")?;
        let mut events = Vec::new();
        for source_path in source_paths {
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read {}", source_path.display()))?;
            let batch = if self.ndjson {
                crate::path_de::from_ndjson_with_path::<EditEvent>(&source)
            } else {
                crate::path_de::from_str_with_path::<Vec<EditEvent>>(&source)
            };
            let batch = batch
                .with_context(|| format!("failed to parse edit script {}", source_path.display()))?;
            tracing::info!(path = %source_path.display(), edits = batch.len(), "loaded edit script");
            events.extend(batch);
        }
        Ok(events)
    }
}

impl OutputSettings {
    fn emit(&self, session: &EditSession) -> Result<()> {
        if let Some(out_dir) = self.out_dir.as_ref() {
            let path = session
                .export_file(out_dir)
                .with_context(|| format!("failed to export {EXPORT_FILE_NAME}"))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display());
        } else {
            let text = session.export_string()?;
            println!("{text}");
        }
        Ok(())
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn verbosity(&self) -> u8 {
        self.verbose
    }

    pub fn run(&self) -> Result<()> {
        match &self.cmd {
            Command::Replay(target) => {
                // debug path
                if target.output.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let events = target.input_settings.load_events()?;
                let mut session = EditSession::new(SessionConfig {
                    empty_group_policy: target.empty_group_policy.into(),
                    seed_root_row: !target.no_seed_row,
                });

                let total = events.len();
                let mut refused = 0usize;
                for (ix, event) in events.into_iter().enumerate() {
                    if let Err(error) = session.apply(event) {
                        if !target.keep_going {
                            bail!("edit {} of {total} refused: {error}", ix + 1);
                        }
                        tracing::warn!(edit = ix + 1, %error, "edit refused, continuing");
                        refused += 1;
                    }
                }
                tracing::info!(applied = total - refused, refused, "replay finished");

                report_duplicates(&session.duplicate_keys());
                target.output.emit(&session)
            }
            Command::Compile(target) => {
                if target.output.no_op {
                    eprintln!("{self:#?}");
                    return Ok(());
                }

                let nodes = read_field_tree(&target.input)?;
                let session = EditSession::from_tree(FieldTree::from_nodes(nodes));
                report_duplicates(&session.duplicate_keys());
                target.output.emit(&session)
            }
            Command::Types => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", "field types".bold())?;
                for ty in FieldType::ALL {
                    writeln!(stdout, "  {:<10} {}", ty.as_str(), ty.label().dimmed())?;
                }
                writeln!(stdout, "{}", "array item types".bold())?;
                for ty in ArrayItemType::ALL {
                    writeln!(stdout, "  {:<10} {}", ty.as_str(), ty.label().dimmed())?;
                }
                Ok(())
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn read_field_tree(path: &Path) -> Result<Vec<FieldNode>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    crate::path_de::from_str_with_path::<Vec<FieldNode>>(&source)
        .with_context(|| format!("failed to parse field tree {}", path.display()))
}

fn report_duplicates(duplicates: &[DuplicateKey]) {
    for dup in duplicates {
        let paths = dup
            .paths
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        eprintln!(
            "{} duplicate key `{}` at {} (last one wins)",
            "warning:".yellow().bold(),
            dup.key,
            paths
        );
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            // glob yields paths in sorted order, which is the replay order
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaDocument;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        CommandLineInterface::command().debug_assert();
    }

    #[test]
    fn parses_replay_flags() {
        let cli = CommandLineInterface::try_parse_from([
            "json-schema-builder",
            "-vv",
            "replay",
            "--input",
            "a.json",
            "b.json",
            "--empty-group-policy",
            "reject",
            "--keep-going",
        ])
        .unwrap();
        assert_eq!(cli.verbosity(), 2);
        let Command::Replay(replay) = cli.cmd else {
            panic!("expected replay");
        };
        assert_eq!(replay.input_settings.input, ["a.json", "b.json"]);
        assert!(matches!(replay.empty_group_policy, PolicyArg::Reject));
        assert!(replay.keep_going);
        assert!(!replay.no_seed_row);
    }

    #[test]
    fn glob_patterns_expand_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["02.json", "01.json", "notes.txt"] {
            std::fs::write(dir.path().join(name), "[]").unwrap();
        }
        let pattern = format!("{}/*.json", dir.path().display());
        let paths = resolve_file_path_patterns([pattern.as_str()]).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["01.json", "02.json"]);

        let empty = format!("{}/*.ndjson", dir.path().display());
        assert!(resolve_file_path_patterns([empty.as_str()]).is_err());
    }

    #[test]
    fn loads_ndjson_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("edits.ndjson");
        std::fs::write(
            &script,
            "{\"op\":\"set_attribute\",\"path\":[0],\"attr\":\"key\",\"value\":\"tags\"}\n\
             {\"op\":\"set_type\",\"path\":[0],\"type\":\"array\"}\n",
        )
        .unwrap();
        let settings = InputSettings {
            ndjson: true,
            input: vec![script.to_string_lossy().into_owned()],
        };
        let events = settings.load_events().unwrap();
        assert_eq!(events.len(), 2);

        let mut session = EditSession::default();
        for event in events {
            session.apply(event).unwrap();
        }
        assert_eq!(
            session.current_schema(),
            &serde_json::from_value::<SchemaDocument>(serde_json::json!({
                "tags": { "type": "array", "items": { "type": "string" } }
            }))
            .unwrap()
        );
    }

    #[test]
    fn address_book_demo_replays() {
        let events: Vec<EditEvent> =
            crate::path_de::from_str_with_path(include_str!("../demos/address_book.json")).unwrap();
        let mut session = EditSession::default();
        for event in events {
            session.apply(event).unwrap();
        }
        assert!(session.duplicate_keys().is_empty());
        assert_eq!(
            session.current_schema().to_value().unwrap(),
            serde_json::json!({
                "name": { "type": "string", "required": true },
                "address": {
                    "type": "object",
                    "properties": {
                        "city": { "type": "string" },
                        "zip": { "type": "number" }
                    }
                },
                "status": { "type": "string", "default": "active", "enum": ["active", "archived"] },
                "tags": { "type": "array", "description": "free-form labels", "items": { "type": "string" } }
            })
        );
    }
}
