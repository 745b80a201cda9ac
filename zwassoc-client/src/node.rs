//! Per-node association helpers.

use crate::client::Client;
use crate::error::ClientError;
use serde_json::Value;
use zwassoc_protocol::cc::{
    AddNodeIds, AssociationGroup, AssociationGroupInfo, GetGroup, GetGroupCount, GetGroupInfo,
    GetGroupName, RemoveAssociationsOptions, RemoveNodeIds,
};
use zwassoc_protocol::{CcApiMethod, CommandClass, GroupId, NodeId};

/// A node on the network, addressed through a [`Client`].
///
/// Holds no state of its own; every call is a request to the server.
/// Methods take the handle by value so `client.node(n).op()` works inline.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    client: &'a Client,
    node_id: NodeId,
}

impl<'a> Node<'a> {
    pub(crate) fn new(client: &'a Client, node_id: NodeId) -> Self {
        Self { client, node_id }
    }

    pub fn id(self) -> NodeId {
        self.node_id
    }

    pub async fn invoke<M: CcApiMethod>(self, method: &M) -> Result<M::Output, ClientError> {
        self.client.invoke(self.node_id, method).await
    }

    pub async fn invoke_cc_api_raw(
        self,
        command_class: impl Into<u8>,
        method_name: &str,
        args: Vec<Value>,
    ) -> Result<Value, ClientError> {
        self.client
            .invoke_cc_api_raw(self.node_id, command_class, method_name, args)
            .await
    }

    /// True if the node supports both Association and AGI.
    pub async fn supports_association(self) -> Result<bool, ClientError> {
        let (association, agi) = tokio::join!(
            self.client
                .supports_cc_api(self.node_id, CommandClass::Association),
            self.client
                .supports_cc_api(self.node_id, CommandClass::AssociationGroupInformation),
        );
        Ok(association? && agi?)
    }

    /// Number of association groups, or `None` if the node did not report one.
    pub async fn get_group_count(self) -> Result<Option<u8>, ClientError> {
        self.invoke(&GetGroupCount).await
    }

    pub async fn get_group(self, group_id: GroupId) -> Result<Option<AssociationGroup>, ClientError> {
        self.invoke(&GetGroup { group_id }).await
    }

    pub async fn add_node_ids(
        self,
        group_id: GroupId,
        node_ids: &[NodeId],
    ) -> Result<(), ClientError> {
        self.invoke(&AddNodeIds {
            group_id,
            node_ids: node_ids.to_vec(),
        })
        .await?;
        Ok(())
    }

    /// Removes associations matching `options`. The filter is sent unchanged.
    pub async fn remove_node_ids(
        self,
        options: RemoveAssociationsOptions,
    ) -> Result<(), ClientError> {
        self.invoke(&RemoveNodeIds(options)).await?;
        Ok(())
    }

    pub async fn get_group_name(self, group_id: GroupId) -> Result<Option<String>, ClientError> {
        self.invoke(&GetGroupName { group_id }).await
    }

    /// AGI details for a group. `refresh_cache` makes the server query the
    /// device instead of answering from its cache.
    pub async fn get_group_info(
        self,
        group_id: GroupId,
        refresh_cache: bool,
    ) -> Result<Option<AssociationGroupInfo>, ClientError> {
        self.invoke(&GetGroupInfo {
            group_id,
            refresh_cache,
        })
        .await
    }
}
