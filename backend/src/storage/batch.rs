use serde_json::Value;

use super::paths::{CollectionPath, DocumentPath};

/// A single mutation or precondition inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Write the whole document, replacing any existing one
    Set { path: DocumentPath, data: Value },
    /// Write the document, failing if it already exists
    Create { path: DocumentPath, data: Value },
    /// Merge top-level fields into an existing document
    Update { path: DocumentPath, fields: Value },
    /// Add `delta` to a numeric field (missing fields count as zero)
    Increment {
        path: DocumentPath,
        field: String,
        delta: i64,
    },
    Delete { path: DocumentPath },
    /// Fail the batch unless the numeric field is at least `min`
    AssertAtLeast {
        path: DocumentPath,
        field: String,
        min: i64,
    },
    /// Fail the batch unless the field equals `value`
    AssertEquals {
        path: DocumentPath,
        field: String,
        value: Value,
    },
    /// Fail the batch if any document of the collection matches every field
    /// of `filter`; an array in the filter matches any of its elements
    AssertNoneMatching {
        collection: CollectionPath,
        filter: Value,
    },
}

impl WriteOp {
    /// Document the operation targets; `None` for collection-wide checks
    pub fn path(&self) -> Option<&DocumentPath> {
        match self {
            WriteOp::Set { path, .. }
            | WriteOp::Create { path, .. }
            | WriteOp::Update { path, .. }
            | WriteOp::Increment { path, .. }
            | WriteOp::Delete { path }
            | WriteOp::AssertAtLeast { path, .. }
            | WriteOp::AssertEquals { path, .. } => Some(path),
            WriteOp::AssertNoneMatching { .. } => None,
        }
    }

    /// Preconditions are checked but write nothing
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            WriteOp::AssertAtLeast { .. }
                | WriteOp::AssertEquals { .. }
                | WriteOp::AssertNoneMatching { .. }
        )
    }
}

/// Ordered group of operations committed atomically: either every operation
/// applies or none does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocumentPath, data: Value) -> &mut Self {
        self.ops.push(WriteOp::Set { path, data });
        self
    }

    pub fn create(&mut self, path: DocumentPath, data: Value) -> &mut Self {
        self.ops.push(WriteOp::Create { path, data });
        self
    }

    pub fn update(&mut self, path: DocumentPath, fields: Value) -> &mut Self {
        self.ops.push(WriteOp::Update { path, fields });
        self
    }

    pub fn increment(&mut self, path: DocumentPath, field: &str, delta: i64) -> &mut Self {
        self.ops.push(WriteOp::Increment {
            path,
            field: field.to_string(),
            delta,
        });
        self
    }

    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn assert_at_least(&mut self, path: DocumentPath, field: &str, min: i64) -> &mut Self {
        self.ops.push(WriteOp::AssertAtLeast {
            path,
            field: field.to_string(),
            min,
        });
        self
    }

    pub fn assert_equals(&mut self, path: DocumentPath, field: &str, value: Value) -> &mut Self {
        self.ops.push(WriteOp::AssertEquals {
            path,
            field: field.to_string(),
            value,
        });
        self
    }

    pub fn assert_none_matching(&mut self, collection: CollectionPath, filter: Value) -> &mut Self {
        self.ops.push(WriteOp::AssertNoneMatching { collection, filter });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}
