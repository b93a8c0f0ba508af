pub mod pihole;
pub mod token;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::AdListEntry;

pub use pihole::PiHoleClient;

/// The service that owns the ad-list configuration.
///
/// Methods take `&mut self`: implementations carry session state that can
/// change on any call, so calls must be issued one at a time and in order.
#[async_trait]
pub trait RemoteListService {
    async fn list_entries(&mut self) -> Result<Vec<AdListEntry>>;

    /// Request a new, enabled entry. Fails without side effects if the
    /// address already exists remotely.
    async fn create_entry(&mut self, address: &str) -> Result<()>;

    /// Set the enabled flag of one entry. `comment` and `groups` are sent
    /// only when given, so the service keeps its current values otherwise.
    async fn set_enabled(
        &mut self,
        id: i64,
        enabled: bool,
        comment: Option<&str>,
        groups: Option<&[i64]>,
    ) -> Result<()>;
}
