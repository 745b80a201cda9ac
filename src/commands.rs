//! Command execution.

use crate::{Commands, GroupCommand};
use colored::Colorize;
use zwassoc_client::{Client, Node};
use zwassoc_protocol::cc::{AssociationGroup, AssociationGroupInfo, RemoveAssociationsOptions};
use zwassoc_protocol::{GroupId, NodeId, VersionInfo};

/// Executes a command and returns the formatted output.
pub async fn execute(
    client: &Client,
    cmd: Commands,
) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Listen => Err("listen is handled by the event loop".into()),

        Commands::Version => {
            let version = client.version().await;
            Ok(format_version(&version))
        }

        Commands::Supports { node_id } => {
            if client.node(node_id).supports_association().await? {
                Ok(format!(
                    "Node {} {} association groups",
                    node_id.to_string().cyan(),
                    "supports".green()
                ))
            } else {
                Ok(format!(
                    "Node {} {} association groups",
                    node_id.to_string().cyan(),
                    "does not support".yellow()
                ))
            }
        }

        Commands::Group { action } => execute_group(client, action).await,
    }
}

async fn execute_group(
    client: &Client,
    action: GroupCommand,
) -> Result<String, Box<dyn std::error::Error>> {
    match action {
        GroupCommand::List { node_id } => list_groups(client.node(node_id)).await,

        GroupCommand::Add {
            node_id,
            group_id,
            node_ids,
        } => {
            client.node(node_id).add_node_ids(group_id, &node_ids).await?;
            Ok(format!(
                "{} [{}] to group {} of node {}",
                "Added".green(),
                format_node_ids(&node_ids),
                group_id,
                node_id.to_string().cyan()
            ))
        }

        GroupCommand::Remove {
            node_id,
            group_id,
            node_ids,
        } => {
            let mut options = RemoveAssociationsOptions::new().with_group(group_id);
            if !node_ids.is_empty() {
                options = options.with_node_ids(node_ids.clone());
            }
            client.node(node_id).remove_node_ids(options).await?;

            let removed = if node_ids.is_empty() {
                "associations".to_string()
            } else {
                format!("[{}]", format_node_ids(&node_ids))
            };
            Ok(format!(
                "{} {} from group {} of node {}",
                "Removed".green(),
                removed,
                group_id,
                node_id.to_string().cyan()
            ))
        }

        GroupCommand::Info {
            node_id,
            group_id,
            refresh,
        } => {
            let node = client.node(node_id);
            let name = node.get_group_name(group_id).await?;
            match node.get_group_info(group_id, refresh).await? {
                Some(info) => Ok(format_group_info(group_id, name.as_deref(), &info)),
                None => Ok(format!("No group information for group {}", group_id)
                    .yellow()
                    .to_string()),
            }
        }
    }
}

/// Lists every group of a node, one request pair per group.
async fn list_groups(node: Node<'_>) -> Result<String, Box<dyn std::error::Error>> {
    let count = match node.get_group_count().await? {
        Some(count) if count > 0 => count,
        _ => return Ok("No groups".yellow().to_string()),
    };

    let mut output = format!(
        "{}\n",
        format!("Node {} has {} groups", node.id(), count).bold()
    );
    for group_id in 1..=count {
        let group = node.get_group(group_id).await?;
        let name = node.get_group_name(group_id).await?;
        output.push_str(&format_group_line(group_id, name.as_deref(), group.as_ref()));
        output.push('\n');
    }
    Ok(output.trim_end().to_string())
}

/// `server 1.2.3 driver 9.0.0 home 0x0000007b`
pub fn format_version_line(version: &VersionInfo) -> String {
    format!(
        "server {} driver {} home {}",
        version.server_version,
        version.driver_version,
        format_home_id(version.home_id)
    )
}

fn format_version(version: &VersionInfo) -> String {
    let mut output = format!(
        "  Server: {}\n  Driver: {}\n  Home ID: {}",
        version.server_version,
        version.driver_version,
        format_home_id(version.home_id)
    );
    if let (Some(min), Some(max)) = (version.min_schema_version, version.max_schema_version) {
        output.push_str(&format!("\n  Schema: {}..={}", min, max));
    }
    output
}

fn format_home_id(home_id: Option<u64>) -> String {
    home_id
        .map(|id| format!("{:#010x}", id))
        .unwrap_or_else(|| "-".to_string())
}

fn format_node_ids(node_ids: &[NodeId]) -> String {
    node_ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// `Group 1: Lifeline 2/5 [1, 3]`
fn format_group_line(
    group_id: GroupId,
    name: Option<&str>,
    group: Option<&AssociationGroup>,
) -> String {
    let name = name.unwrap_or("(unnamed)");
    match group {
        Some(group) => format!(
            "Group {}: {} {}/{} [{}]",
            group_id,
            name,
            group.node_ids.len(),
            group.max_nodes,
            format_node_ids(&group.node_ids)
        ),
        None => format!("Group {}: {} (no membership reported)", group_id, name),
    }
}

fn format_group_info(group_id: GroupId, name: Option<&str>, info: &AssociationGroupInfo) -> String {
    format!(
        "Group {}: {}\n  Mode: {}\n  Profile: {:#06x}\n  Event code: {:#06x}\n  Dynamic info: {}",
        group_id,
        name.unwrap_or("(unnamed)"),
        info.mode,
        info.profile,
        info.event_code,
        if info.has_dynamic_info { "yes" } else { "no" }
    )
}
