//! In-memory catalog for exercising the read paths without a CTFd instance.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use ctfsync_client::wire::{
    ChallengeDetail, ChallengeStub, FileRecord, FlagRecord, HintRecord, HintRequirements,
    RequirementsRecord, TagRecord, TopicRecord,
};
use ctfsync_client::{CatalogApi, ClientError};
use ctfsync_core::ChallengeId;

#[derive(Default)]
pub(crate) struct FakeCatalog {
    ids: Vec<u64>,
    list_failure: Option<String>,
    list_hangs: bool,
    failures: HashMap<(u64, &'static str), String>,
    missing: HashSet<u64>,
    hanging: HashSet<u64>,
    delays: HashMap<u64, Duration>,
    requirements: HashMap<u64, RequirementsRecord>,
    foreign_tags: HashMap<u64, u64>,
    list_calls: AtomicUsize,
    challenge_calls: AtomicUsize,
    sub_calls: AtomicUsize,
}

impl FakeCatalog {
    /// A catalog listing `ids` in that order, each fully populated.
    pub fn with_challenges(ids: &[u64]) -> Self {
        Self {
            ids: ids.to_vec(),
            ..Default::default()
        }
    }

    pub fn fail_list(mut self, msg: &str) -> Self {
        self.list_failure = Some(msg.to_string());
        self
    }

    /// The list call never completes.
    pub fn hang_list(mut self) -> Self {
        self.list_hangs = true;
        self
    }

    /// Make one endpoint of challenge `id` fail. `what` is `challenge` for the
    /// detail fetch or the sub-collection name.
    pub fn fail(mut self, id: u64, what: &'static str, msg: &str) -> Self {
        self.failures.insert((id, what), msg.to_string());
        self
    }

    pub fn missing(mut self, id: u64) -> Self {
        self.missing.insert(id);
        self
    }

    /// The detail fetch of `id` never completes.
    pub fn hang(mut self, id: u64) -> Self {
        self.hanging.insert(id);
        self
    }

    pub fn delay(mut self, id: u64, delay: Duration) -> Self {
        self.delays.insert(id, delay);
        self
    }

    pub fn requires(mut self, id: u64, prerequisites: &[u64], anonymize: bool) -> Self {
        self.requirements.insert(
            id,
            RequirementsRecord {
                prerequisites: prerequisites.to_vec(),
                anonymize: Some(anonymize),
            },
        );
        self
    }

    /// Slip a tag owned by `owner` into the tags of `id`.
    pub fn foreign_tag(mut self, id: u64, owner: u64) -> Self {
        self.foreign_tags.insert(id, owner);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn challenge_calls(&self) -> usize {
        self.challenge_calls.load(Ordering::SeqCst)
    }

    pub fn sub_collection_calls(&self) -> usize {
        self.sub_calls.load(Ordering::SeqCst)
    }

    fn check(&self, id: ChallengeId, what: &'static str) -> Result<(), ClientError> {
        if what != "challenge" {
            self.sub_calls.fetch_add(1, Ordering::SeqCst);
        }
        match self.failures.get(&(id.0, what)) {
            Some(msg) => Err(ClientError::Server {
                status: 504,
                body: msg.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn list_challenges(&self) -> Result<Vec<ChallengeStub>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_hangs {
            std::future::pending::<()>().await;
        }
        if let Some(msg) = &self.list_failure {
            return Err(ClientError::Server {
                status: 502,
                body: msg.clone(),
            });
        }
        Ok(self
            .ids
            .iter()
            .map(|&id| ChallengeStub {
                id,
                name: format!("chall-{id}"),
            })
            .collect())
    }

    async fn get_challenge(&self, id: ChallengeId) -> Result<ChallengeDetail, ClientError> {
        self.challenge_calls.fetch_add(1, Ordering::SeqCst);
        if self.hanging.contains(&id.0) {
            std::future::pending::<()>().await;
        }
        if let Some(delay) = self.delays.get(&id.0) {
            tokio::time::sleep(*delay).await;
        }
        self.check(id, "challenge")?;
        if self.missing.contains(&id.0) || !self.ids.contains(&id.0) {
            return Err(ClientError::Server {
                status: 404,
                body: r#"{"success": false}"#.into(),
            });
        }
        Ok(ChallengeDetail {
            id: id.0,
            name: format!("chall-{id}"),
            category: "misc".into(),
            description: Some(format!("description of {id}")),
            connection_info: None,
            max_attempts: Some(0),
            function: None,
            value: Some(100),
            initial: None,
            decay: None,
            minimum: None,
            state: "visible".into(),
            kind: "standard".into(),
        })
    }

    async fn get_requirements(&self, id: ChallengeId) -> Result<RequirementsRecord, ClientError> {
        self.check(id, "requirements")?;
        Ok(self.requirements.get(&id.0).cloned().unwrap_or_default())
    }

    async fn get_flags(&self, id: ChallengeId) -> Result<Vec<FlagRecord>, ClientError> {
        self.check(id, "flags")?;
        let n = id.0;
        Ok(vec![
            FlagRecord {
                id: n * 100 + 1,
                challenge_id: Some(n),
                kind: "static".into(),
                content: format!("CTF{{{n}-a}}"),
                data: None,
            },
            FlagRecord {
                id: n * 100 + 2,
                challenge_id: Some(n),
                kind: "regex".into(),
                content: format!("CTF{{{n}-b}}"),
                data: Some("case_insensitive".into()),
            },
        ])
    }

    async fn get_hints(&self, id: ChallengeId) -> Result<Vec<HintRecord>, ClientError> {
        self.check(id, "hints")?;
        let n = id.0;
        Ok(vec![
            HintRecord {
                id: n * 100 + 1,
                challenge_id: Some(n),
                content: "look closer".into(),
                cost: 0,
                requirements: None,
            },
            HintRecord {
                id: n * 100 + 2,
                challenge_id: Some(n),
                content: "closer still".into(),
                cost: 10,
                requirements: Some(HintRequirements {
                    prerequisites: vec![n * 100 + 1],
                }),
            },
        ])
    }

    async fn get_files(&self, id: ChallengeId) -> Result<Vec<FileRecord>, ClientError> {
        self.check(id, "files")?;
        Ok(vec![FileRecord {
            id: id.0,
            kind: "challenge".into(),
            location: format!("{:08x}/handout.zip", id.0),
            sha1sum: None,
        }])
    }

    async fn get_tags(&self, id: ChallengeId) -> Result<Vec<TagRecord>, ClientError> {
        self.check(id, "tags")?;
        let mut tags = vec![TagRecord {
            id: id.0,
            challenge_id: Some(id.0),
            value: format!("tag-{id}"),
        }];
        if let Some(&owner) = self.foreign_tags.get(&id.0) {
            tags.push(TagRecord {
                id: 1000 + owner,
                challenge_id: Some(owner),
                value: format!("tag-{owner}"),
            });
        }
        Ok(tags)
    }

    async fn get_topics(&self, id: ChallengeId) -> Result<Vec<TopicRecord>, ClientError> {
        self.check(id, "topics")?;
        Ok(vec![TopicRecord {
            id: id.0,
            challenge_id: Some(id.0),
            value: format!("topic-{id}"),
        }])
    }
}
