//! Common module for library exports

pub use crate::backends::{ResourceStats, SnapshotBackend};
#[cfg(target_os = "linux")]
pub use crate::backends::ProcfsBackend;
pub use crate::bridge::{read_typed_array, BackendBridge, DebugBackend, DebuggerBridge};
pub use crate::config::{BridgeConfig, NavigatorConfig};
pub use crate::error::{ModuleKey, RemoraError, RemoraResult};
pub use crate::events::{BridgeEvent, DebuggerStatus};
pub use crate::metadata::{
    ArrayLayout, ArrayLength, ArrayStorage, DispatchTable, StaticMetadata, TypeDescriptor, TypeMetadataProvider,
};
pub use crate::navigation::{
    ArrayWalk, Cursor, CursorSeq, FieldPath, ListWalk, Navigator, NextLink, Pending, RemoteObject, TypeVariants,
    Variant,
};
pub use crate::registry::{ComputedField, FieldOutput, PresentationHint, Registry, RootSet, TypeKey};
pub use crate::types::{Address, Endianness, ModuleDescriptor, ScalarKind, ScalarValue, StackFrame};
