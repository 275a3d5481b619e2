//! 核心编排层：时钟与 ID、错误类型、快照存储、规划器接口、单步编排

pub mod clock;
pub mod coordinator;
pub mod error;
pub mod planner;
pub mod snapshot;

pub use clock::{Clock, FixedClock, IdGenerator, SequentialIdGenerator, SystemClock, UuidIdGenerator};
pub use coordinator::{CoordinatorSettings, StepCoordinator, StepOutcome, StepRequest};
pub use error::{
    BoundaryError, ConstructionError, ExecutorError, FieldIssue, MemoryError, SendError, StepError,
    ValidationError,
};
pub use planner::{HeuristicPlanner, Planner};
pub use snapshot::{InMemorySnapshotStore, SnapshotStore, StepSnapshot};
