//! `list-tools` command
//!
//! Shows what a client would see under the current configuration, or under a
//! preset/profile, without contacting GitLab. Tier requirements are shown as
//! badges instead of being filtered.

use clap::Args;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::io::Write;

use crate::catalog::{CatalogPolicy, GateValues, Tier};
use crate::config::{AppConfig, ProfileKind, ProfileSet, build_policy};
use crate::tools::{RegisteredTool, RegistryManager};

use super::CliError;

#[derive(Args, Debug, Clone, Default)]
pub struct ListToolsArgs {
    /// Print JSON
    #[arg(long)]
    pub json: bool,

    /// Print tool names only
    #[arg(long)]
    pub simple: bool,

    /// Include descriptions and action operations
    #[arg(short, long)]
    pub verbose: bool,

    /// Print a markdown document
    #[arg(long)]
    pub export: bool,

    /// Show the catalog under a built-in preset
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Show the catalog under a user profile
    #[arg(long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Diff the current catalog against a preset or profile
    #[arg(long, value_name = "NAME")]
    pub compare: Option<String>,

    /// Check presets and profiles for unknown tools and actions
    #[arg(long)]
    pub validate: bool,

    /// Show environment gates and the tools they control
    #[arg(long)]
    pub env_gates: bool,
}

/// How the catalog is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Simple,
    Json,
    Markdown,
}

#[derive(Debug, Serialize)]
struct ToolEntry<'a> {
    name: &'a str,
    entity: &'a str,
    description: &'a str,
    read_only: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<Tier>,
    actions: Vec<ActionEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct ActionEntry<'a> {
    name: &'a str,
    operation: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tier: Option<Tier>,
}

impl ListToolsArgs {
    /// Output format after rejecting conflicting flags
    pub fn format(&self) -> Result<OutputFormat, CliError> {
        let formats = [
            (self.json, "--json", OutputFormat::Json),
            (self.simple, "--simple", OutputFormat::Simple),
            (self.export, "--export", OutputFormat::Markdown),
        ];
        let chosen: Vec<_> = formats.iter().filter(|(set, _, _)| *set).collect();
        if chosen.len() > 1 {
            let flags: Vec<&str> = chosen.iter().map(|(_, flag, _)| *flag).collect();
            return Err(CliError::Usage(format!(
                "{} cannot be combined",
                flags.join(" and ")
            )));
        }

        if self.preset.is_some() && self.profile.is_some() {
            return Err(CliError::Usage(
                "--preset and --profile cannot be combined".into(),
            ));
        }

        let modes = [
            (self.validate, "--validate"),
            (self.env_gates, "--env-gates"),
            (self.compare.is_some(), "--compare"),
        ];
        let mode_flags: Vec<&str> = modes.iter().filter(|(set, _)| *set).map(|(_, f)| *f).collect();
        if mode_flags.len() > 1 {
            return Err(CliError::Usage(format!(
                "{} cannot be combined",
                mode_flags.join(" and ")
            )));
        }
        if let Some(mode) = mode_flags.first() {
            if let Some((_, flag, _)) = chosen.first() {
                return Err(CliError::Usage(format!("{} cannot be combined with {}", mode, flag)));
            }
        }

        Ok(chosen
            .first()
            .map(|(_, _, format)| *format)
            .unwrap_or(OutputFormat::Table))
    }

    /// Run the command against a loaded configuration
    pub fn run(&self, config: &AppConfig, out: &mut dyn Write) -> Result<(), CliError> {
        let format = self.format()?;
        let profiles = ProfileSet::load(config.tools.profiles_path.as_deref())?;
        self.run_with(config, &profiles, GateValues::from_process(), format, out)
    }

    pub(crate) fn run_with(
        &self,
        config: &AppConfig,
        profiles: &ProfileSet,
        gates: GateValues,
        format: OutputFormat,
        out: &mut dyn Write,
    ) -> Result<(), CliError> {
        let tier = config.tools.tier.as_deref().and_then(|t| t.parse().ok());
        let active = self.active_policy(config, profiles, gates.clone(), tier)?;
        let manager = RegistryManager::new(active.clone());

        if self.validate {
            let problems = profiles.validate(&manager.tool_action_index());
            if problems.is_empty() {
                writeln!(out, "All presets and profiles are valid")?;
                return Ok(());
            }
            for problem in &problems {
                writeln!(out, "error: {}", problem)?;
            }
            return Err(CliError::Validation(problems.len()));
        }

        if self.env_gates {
            out.write_all(render_env_gates(&manager, &active).as_bytes())?;
            return Ok(());
        }

        if let Some(name) = &self.compare {
            let (_, other) = profiles.resolve(name)?;
            let other_policy = build_policy(&config.tools, Some(&other), gates, tier);
            out.write_all(render_compare(&manager, &active, name, &other_policy).as_bytes())?;
            return Ok(());
        }

        let rendered = match format {
            OutputFormat::Table => render_table(&manager, &active, self.verbose),
            OutputFormat::Simple => render_simple(&manager, &active),
            OutputFormat::Json => render_json(&manager, &active)?,
            OutputFormat::Markdown => render_markdown(&manager, &active),
        };
        out.write_all(rendered.as_bytes())?;
        Ok(())
    }

    /// Policy of `--preset`/`--profile`, else of the configured profile
    fn active_policy(
        &self,
        config: &AppConfig,
        profiles: &ProfileSet,
        gates: GateValues,
        tier: Option<Tier>,
    ) -> Result<CatalogPolicy, CliError> {
        let profile = if let Some(name) = &self.preset {
            match profiles.preset(name) {
                Some(preset) => Some(preset.clone()),
                None => return Err(unknown_name("preset", name, profiles.preset_names())),
            }
        } else if let Some(name) = &self.profile {
            match profiles.resolve(name) {
                Ok((ProfileKind::Profile, profile)) => Some(profile),
                _ => return Err(unknown_name("profile", name, profiles.profile_names())),
            }
        } else {
            match config.tools.profile.as_deref() {
                Some(name) => Some(profiles.resolve(name)?.1),
                None => None,
            }
        };

        Ok(build_policy(&config.tools, profile.as_ref(), gates, tier))
    }
}

fn unknown_name<'a>(kind: &str, name: &str, known: impl Iterator<Item = &'a str>) -> CliError {
    let known: Vec<&str> = known.collect();
    let known = if known.is_empty() {
        "none".to_string()
    } else {
        known.join(", ")
    };
    CliError::Usage(format!("unknown {} '{}' (available: {})", kind, name, known))
}

fn tool_entries<'a>(manager: &'a RegistryManager, policy: &CatalogPolicy) -> Vec<ToolEntry<'a>> {
    manager
        .tierless_for(policy)
        .into_iter()
        .map(|tool| ToolEntry {
            name: tool.name,
            entity: tool.entity.as_str(),
            description: tool.description,
            read_only: !tool.shape.has_mutating_operation(),
            tier: manager.metadata().tool_tier(tool.name),
            actions: manager
                .visible_actions(tool, policy, false)
                .into_iter()
                .map(|action| ActionEntry {
                    name: action.name,
                    operation: action.operation.as_str(),
                    tier: manager.metadata().action_tier(tool.name, action.name),
                })
                .collect(),
        })
        .collect()
}

/// `[premium]`, or `[premium, unavailable]` when the known tier is too low
fn tier_badge(policy: &CatalogPolicy, required: Option<Tier>) -> String {
    match required {
        None => String::new(),
        Some(tier) if policy.tier_met(Some(tier)) => format!(" [{}]", tier),
        Some(tier) => format!(" [{}, unavailable]", tier),
    }
}

fn render_table(manager: &RegistryManager, policy: &CatalogPolicy, verbose: bool) -> String {
    let entries = tool_entries(manager, policy);
    let mut text = String::new();

    for registry in manager.registries() {
        let entity = registry.entity().as_str();
        let tools: Vec<&ToolEntry> = entries.iter().filter(|e| e.entity == entity).collect();
        if tools.is_empty() {
            continue;
        }

        let _ = writeln!(text, "{} ({})", entity, tools.len());
        for tool in tools {
            let badge = tier_badge(policy, tool.tier);
            if verbose {
                let _ = writeln!(text, "  {}{}", tool.name, badge);
                let _ = writeln!(text, "      {}", tool.description);
                for action in &tool.actions {
                    let _ = writeln!(
                        text,
                        "      - {} ({}){}",
                        action.name,
                        action.operation,
                        tier_badge(policy, action.tier)
                    );
                }
            } else if tool.actions.is_empty() {
                let _ = writeln!(text, "  {}{}", tool.name, badge);
            } else {
                let actions: Vec<String> = tool
                    .actions
                    .iter()
                    .map(|a| format!("{}{}", a.name, tier_badge(policy, a.tier)))
                    .collect();
                let _ = writeln!(text, "  {:<22}{} {}", tool.name, badge, actions.join(", "));
            }
        }
        text.push('\n');
    }

    let mode = if policy.read_only() { ", read-only" } else { "" };
    let _ = writeln!(text, "{} of {} tools exposed{}", entries.len(), manager.len(), mode);
    text
}

fn render_simple(manager: &RegistryManager, policy: &CatalogPolicy) -> String {
    manager
        .tierless_for(policy)
        .into_iter()
        .map(|tool| format!("{}\n", tool.name))
        .collect()
}

fn render_json(manager: &RegistryManager, policy: &CatalogPolicy) -> Result<String, CliError> {
    let mut text = serde_json::to_string_pretty(&tool_entries(manager, policy))?;
    text.push('\n');
    Ok(text)
}

fn render_markdown(manager: &RegistryManager, policy: &CatalogPolicy) -> String {
    let entries = tool_entries(manager, policy);
    let mut text = String::from("# GitLab MCP tools\n\n");

    for registry in manager.registries() {
        let entity = registry.entity().as_str();
        let tools: Vec<&ToolEntry> = entries.iter().filter(|e| e.entity == entity).collect();
        if tools.is_empty() {
            continue;
        }

        let _ = writeln!(text, "## {}\n", entity);
        text.push_str("| Tool | Actions | Description |\n|---|---|---|\n");
        for tool in tools {
            let actions = if tool.actions.is_empty() {
                "-".to_string()
            } else {
                tool.actions
                    .iter()
                    .map(|a| format!("`{}`", a.name))
                    .collect::<Vec<_>>()
                    .join(", ")
            };
            let _ = writeln!(
                text,
                "| `{}`{} | {} | {} |",
                tool.name,
                tier_badge(policy, tool.tier),
                actions,
                tool.description.replace('|', "\\|")
            );
        }
        text.push('\n');
    }
    text
}

fn render_env_gates(manager: &RegistryManager, policy: &CatalogPolicy) -> String {
    let metadata = manager.metadata();
    let mut text = String::new();

    for gate in metadata.all_gates() {
        let raw = policy.gates().raw(&gate).unwrap_or("unset");
        let state = if policy.gates().is_enabled(&gate) {
            "enabled"
        } else {
            "disabled"
        };
        let tools: Vec<&str> = manager
            .all_tool_definitions_unfiltered()
            .into_iter()
            .filter(|tool| metadata.gate_for(tool.name, tool.entity) == Some(gate))
            .map(|tool| tool.name)
            .collect();

        let _ = writeln!(
            text,
            "{:<18} {:<8} (value: {}, default: {})",
            gate.env_var, state, raw, gate.default_value
        );
        let _ = writeln!(text, "    {}", tools.join(", "));
    }
    text
}

fn render_compare(
    manager: &RegistryManager,
    current: &CatalogPolicy,
    name: &str,
    other: &CatalogPolicy,
) -> String {
    let exposed = |policy: &CatalogPolicy| -> BTreeSet<(&'static str, Vec<&'static str>)> {
        manager
            .tierless_for(policy)
            .into_iter()
            .map(|tool: &RegisteredTool| {
                let actions = manager
                    .visible_actions(tool, policy, false)
                    .into_iter()
                    .map(|a| a.name)
                    .collect();
                (tool.name, actions)
            })
            .collect()
    };
    let ours = exposed(current);
    let theirs = exposed(other);

    let mut text = format!("Current configuration vs '{}'\n", name);
    let mut differences = 0;

    for (tool, actions) in &ours {
        match theirs.iter().find(|(t, _)| t == tool) {
            None => {
                differences += 1;
                let _ = writeln!(text, "- {}", tool);
            }
            Some((_, other_actions)) if other_actions != actions => {
                differences += 1;
                let removed: Vec<&str> = actions
                    .iter()
                    .filter(|a| !other_actions.contains(*a))
                    .copied()
                    .collect();
                let added: Vec<&str> = other_actions
                    .iter()
                    .filter(|a| !actions.contains(*a))
                    .copied()
                    .collect();
                let _ = write!(text, "~ {}", tool);
                if !removed.is_empty() {
                    let _ = write!(text, " -[{}]", removed.join(", "));
                }
                if !added.is_empty() {
                    let _ = write!(text, " +[{}]", added.join(", "));
                }
                text.push('\n');
            }
            Some(_) => {}
        }
    }
    for (tool, _) in &theirs {
        if !ours.iter().any(|(t, _)| t == tool) {
            differences += 1;
            let _ = writeln!(text, "+ {}", tool);
        }
    }

    if differences == 0 {
        text.push_str("No differences\n");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> ListToolsArgs {
        ListToolsArgs::default()
    }

    fn run(args: ListToolsArgs, config: &AppConfig) -> (Result<(), CliError>, String) {
        let profiles = ProfileSet::builtin().unwrap();
        let mut out = Vec::new();
        let result = args.format().and_then(|format| {
            args.run_with(config, &profiles, GateValues::default(), format, &mut out)
        });
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_conflicting_formats() {
        let args = ListToolsArgs {
            json: true,
            simple: true,
            ..args()
        };
        assert!(matches!(args.format(), Err(CliError::Usage(_))));

        let args = ListToolsArgs {
            validate: true,
            json: true,
            ..ListToolsArgs::default()
        };
        assert!(matches!(args.format(), Err(CliError::Usage(_))));

        let args = ListToolsArgs {
            preset: Some("readonly".into()),
            profile: Some("work".into()),
            ..ListToolsArgs::default()
        };
        assert!(matches!(args.format(), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_simple_lists_names() {
        let (result, output) = run(
            ListToolsArgs {
                simple: true,
                ..args()
            },
            &AppConfig::default(),
        );
        result.unwrap();
        let names: Vec<&str> = output.lines().collect();
        assert!(names.contains(&"browse_projects"));
        assert!(names.contains(&"manage_files"));
        assert_eq!(names.len(), 22);
    }

    #[test]
    fn test_readonly_preset_drops_mutating_tools() {
        let (result, output) = run(
            ListToolsArgs {
                json: true,
                preset: Some("readonly".into()),
                ..args()
            },
            &AppConfig::default(),
        );
        result.unwrap();

        let tools: serde_json::Value = serde_json::from_str(&output).unwrap();
        let names: Vec<&str> = tools
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"browse_milestones"));
        assert!(!names.contains(&"manage_milestone"));
        assert!(!names.contains(&"create_group"));
    }

    #[test]
    fn test_tier_badge_shown_instead_of_filtering() {
        let mut config = AppConfig::default();
        config.tools.tier = Some("free".into());
        let (result, output) = run(
            ListToolsArgs {
                verbose: true,
                ..args()
            },
            &config,
        );
        result.unwrap();
        assert!(output.contains("burndown (read) [premium, unavailable]"));
    }

    #[test]
    fn test_unknown_preset() {
        let (result, _) = run(
            ListToolsArgs {
                preset: Some("nope".into()),
                ..args()
            },
            &AppConfig::default(),
        );
        let err = result.unwrap_err();
        assert!(err.to_string().contains("unknown preset 'nope'"));
    }

    #[test]
    fn test_validate_builtin_presets() {
        let (result, output) = run(
            ListToolsArgs {
                validate: true,
                ..args()
            },
            &AppConfig::default(),
        );
        result.unwrap();
        assert!(output.contains("valid"));
    }

    #[test]
    fn test_compare_with_readonly() {
        let (result, output) = run(
            ListToolsArgs {
                compare: Some("readonly".into()),
                ..args()
            },
            &AppConfig::default(),
        );
        result.unwrap();
        assert!(output.contains("- manage_milestone"));
        assert!(output.contains("~ manage_integration"));
    }

    #[test]
    fn test_env_gates_output() {
        let (result, output) = run(
            ListToolsArgs {
                env_gates: true,
                ..args()
            },
            &AppConfig::default(),
        );
        result.unwrap();
        assert!(output.contains("USE_MILESTONE"));
        assert!(output.contains("browse_milestones, manage_milestone"));
    }

    #[test]
    fn test_markdown_export() {
        let (result, output) = run(
            ListToolsArgs {
                export: true,
                ..args()
            },
            &AppConfig::default(),
        );
        result.unwrap();
        assert!(output.starts_with("# GitLab MCP tools"));
        assert!(output.contains("## core"));
        assert!(output.contains("| `browse_projects` |"));
    }
}
