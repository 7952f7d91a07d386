//! Ordered traversal of upstream groups.

use super::racer::{is_acceptable, GroupRacer};
use hickory_proto::op::Message;
use rally_dns_domain::UpstreamGroup;
use std::sync::Arc;
use tracing::debug;

/// Walks the configured groups in order until one yields a reply with
/// answers.
///
/// When no group does, the last reply seen is returned anyway so that
/// NXDOMAIN and empty NOERROR responses reach the client instead of turning
/// into server failures. `None` means every exchange of every group failed.
#[derive(Debug, Clone)]
pub struct GroupCascade {
    racer: GroupRacer,
    groups: Arc<[UpstreamGroup]>,
}

impl GroupCascade {
    pub fn new(racer: GroupRacer, groups: Vec<UpstreamGroup>) -> Self {
        Self {
            racer,
            groups: groups.into(),
        }
    }

    pub async fn resolve(&self, query: &Message) -> Option<Message> {
        let mut last = None;
        for (position, group) in self.groups.iter().enumerate() {
            last = self.racer.race(query, &group.servers).await;
            if is_acceptable(last.as_ref()) {
                debug!(group = position, "group answered");
                break;
            }
            debug!(group = position, "group had no answers, falling back");
        }
        last
    }
}
