use strum::{Display, IntoStaticStr};

/// States of a single cross-posting run, in the order they are entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStage {
    CheckDedup,
    FetchContent,
    ResolveMedia,
    UploadMedia,
    NormalizeText,
    Publish,
    CommitDedup,
    Cleanup,
    Done,
    Failed,
}
