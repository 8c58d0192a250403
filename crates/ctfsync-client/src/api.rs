use async_trait::async_trait;
use ctfsync_core::ChallengeId;

use crate::ClientError;
use crate::wire::{
    ChallengeDetail, ChallengeStub, FileRecord, FlagRecord, HintRecord, RequirementsRecord,
    TagRecord, TopicRecord,
};

/// Read access to a CTFd challenge catalog.
///
/// Every call is stateless and either returns the whole result or an error,
/// never a partial list.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_challenges(&self) -> Result<Vec<ChallengeStub>, ClientError>;

    async fn get_challenge(&self, id: ChallengeId) -> Result<ChallengeDetail, ClientError>;

    async fn get_requirements(&self, id: ChallengeId) -> Result<RequirementsRecord, ClientError>;

    async fn get_flags(&self, id: ChallengeId) -> Result<Vec<FlagRecord>, ClientError>;

    async fn get_hints(&self, id: ChallengeId) -> Result<Vec<HintRecord>, ClientError>;

    async fn get_files(&self, id: ChallengeId) -> Result<Vec<FileRecord>, ClientError>;

    async fn get_tags(&self, id: ChallengeId) -> Result<Vec<TagRecord>, ClientError>;

    async fn get_topics(&self, id: ChallengeId) -> Result<Vec<TopicRecord>, ClientError>;
}
