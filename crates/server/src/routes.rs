//! Method → operation table.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;

use crate::fs::FileSystem;
use crate::handler::{DeleteFile, Operation, ReadFile, WriteFile};

/// Immutable after [`RoutesBuilder::build`]; methods without an entry are
/// not allowed.
pub struct Routes {
    operations: HashMap<Method, Box<dyn Operation>>,
}

impl Routes {
    pub fn builder() -> RoutesBuilder {
        RoutesBuilder { operations: HashMap::new() }
    }

    /// `GET`, `PUT` and `DELETE` over `fs`.
    pub fn file_access<F: FileSystem>(fs: F) -> Self {
        let fs = Arc::new(fs);
        Self::builder()
            .route(Method::GET, ReadFile::new(Arc::clone(&fs)))
            .route(Method::PUT, WriteFile::new(Arc::clone(&fs)))
            .route(Method::DELETE, DeleteFile::new(fs))
            .build()
    }

    pub fn get(&self, method: &Method) -> Option<&dyn Operation> {
        self.operations.get(method).map(Box::as_ref)
    }
}

impl fmt::Debug for Routes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routes").field("methods", &self.operations.keys().collect::<Vec<_>>()).finish()
    }
}

pub struct RoutesBuilder {
    operations: HashMap<Method, Box<dyn Operation>>,
}

impl RoutesBuilder {
    /// Registers `operation` for `method`, replacing any earlier one.
    #[must_use]
    pub fn route(mut self, method: Method, operation: impl Operation + 'static) -> Self {
        self.operations.insert(method, Box::new(operation));
        self
    }

    pub fn build(self) -> Routes {
        Routes { operations: self.operations }
    }
}

impl fmt::Debug for RoutesBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutesBuilder").field("methods", &self.operations.keys().collect::<Vec<_>>()).finish()
    }
}
