//! Statically typed command class API calls.
//!
//! The server exposes command class APIs as `(commandClass, methodName, args)`
//! triples. Each supported method is modelled as a struct implementing
//! [`CcApiMethod`], which fixes the command class, the method name, how the
//! positional arguments are laid out and what the response decodes to.

use crate::message::Command;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Z-Wave node identifier.
pub type NodeId = u16;

/// Association group identifier (groups are numbered from 1).
pub type GroupId = u8;

/// Command classes this client knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandClass {
    AssociationGroupInformation = 0x59,
    Association = 0x85,
}

impl CommandClass {
    /// Returns the numeric command class id.
    pub const fn id(self) -> u8 {
        self as u8
    }
}

impl From<CommandClass> for u8 {
    fn from(cc: CommandClass) -> u8 {
        cc.id()
    }
}

impl TryFrom<u8> for CommandClass {
    type Error = u8;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        match id {
            0x59 => Ok(CommandClass::AssociationGroupInformation),
            0x85 => Ok(CommandClass::Association),
            other => Err(other),
        }
    }
}

impl fmt::Display for CommandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandClass::AssociationGroupInformation => write!(f, "Association Group Information"),
            CommandClass::Association => write!(f, "Association"),
        }
    }
}

/// A command class API method with a fixed argument and response shape.
pub trait CcApiMethod {
    const COMMAND_CLASS: CommandClass;
    const METHOD: &'static str;

    /// Decoded form of the `response` field.
    type Output: DeserializeOwned;

    /// Positional arguments, in the order the server expects them.
    fn args(&self) -> Vec<Value>;

    /// Builds the invoke command addressed to `node_id`.
    fn to_command(&self, node_id: NodeId) -> Command {
        Command::InvokeCcApi {
            node_id,
            command_class: Self::COMMAND_CLASS.id(),
            method_name: Self::METHOD.to_string(),
            args: self.args(),
        }
    }
}

/// Members of an association group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationGroup {
    pub max_nodes: u8,
    pub node_ids: Vec<NodeId>,
}

/// Association Group Information for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationGroupInfo {
    pub mode: u8,
    pub profile: u16,
    pub event_code: u16,
    pub has_dynamic_info: bool,
}

/// Filter for removing associations. Omitted fields are left out of the
/// request entirely; the server decides what an open filter means.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveAssociationsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_ids: Option<Vec<NodeId>>,
}

impl RemoveAssociationsOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group_id: GroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    pub fn with_node_ids(mut self, node_ids: impl Into<Vec<NodeId>>) -> Self {
        self.node_ids = Some(node_ids.into());
        self
    }
}

// ============================================================================
// Association (0x85)
// ============================================================================

/// `Association.getGroupCount()`
#[derive(Debug, Clone, Copy, Default)]
pub struct GetGroupCount;

impl CcApiMethod for GetGroupCount {
    const COMMAND_CLASS: CommandClass = CommandClass::Association;
    const METHOD: &'static str = "getGroupCount";
    type Output = Option<u8>;

    fn args(&self) -> Vec<Value> {
        Vec::new()
    }
}

/// `Association.getGroup(groupId)`
#[derive(Debug, Clone, Copy)]
pub struct GetGroup {
    pub group_id: GroupId,
}

impl CcApiMethod for GetGroup {
    const COMMAND_CLASS: CommandClass = CommandClass::Association;
    const METHOD: &'static str = "getGroup";
    type Output = Option<AssociationGroup>;

    fn args(&self) -> Vec<Value> {
        vec![json!(self.group_id)]
    }
}

/// `Association.addNodeIds(groupId, ...nodeIds)`
#[derive(Debug, Clone)]
pub struct AddNodeIds {
    pub group_id: GroupId,
    pub node_ids: Vec<NodeId>,
}

impl CcApiMethod for AddNodeIds {
    const COMMAND_CLASS: CommandClass = CommandClass::Association;
    const METHOD: &'static str = "addNodeIds";
    type Output = IgnoredAny;

    fn args(&self) -> Vec<Value> {
        std::iter::once(json!(self.group_id))
            .chain(self.node_ids.iter().map(|id| json!(id)))
            .collect()
    }
}

/// `Association.removeNodeIds(options)`
#[derive(Debug, Clone)]
pub struct RemoveNodeIds(pub RemoveAssociationsOptions);

impl CcApiMethod for RemoveNodeIds {
    const COMMAND_CLASS: CommandClass = CommandClass::Association;
    const METHOD: &'static str = "removeNodeIds";
    type Output = IgnoredAny;

    fn args(&self) -> Vec<Value> {
        vec![json!(self.0)]
    }
}

// ============================================================================
// Association Group Information (0x59)
// ============================================================================

/// `AssociationGroupInfo.getGroupName(groupId)`
#[derive(Debug, Clone, Copy)]
pub struct GetGroupName {
    pub group_id: GroupId,
}

impl CcApiMethod for GetGroupName {
    const COMMAND_CLASS: CommandClass = CommandClass::AssociationGroupInformation;
    const METHOD: &'static str = "getGroupName";
    type Output = Option<String>;

    fn args(&self) -> Vec<Value> {
        vec![json!(self.group_id)]
    }
}

/// `AssociationGroupInfo.getGroupInfo(groupId, refreshCache)`
#[derive(Debug, Clone, Copy)]
pub struct GetGroupInfo {
    pub group_id: GroupId,
    pub refresh_cache: bool,
}

impl CcApiMethod for GetGroupInfo {
    const COMMAND_CLASS: CommandClass = CommandClass::AssociationGroupInformation;
    const METHOD: &'static str = "getGroupInfo";
    type Output = Option<AssociationGroupInfo>;

    fn args(&self) -> Vec<Value> {
        vec![json!(self.group_id), json!(self.refresh_cache)]
    }
}
