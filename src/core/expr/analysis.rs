//! Structural queries on expressions, implemented with the stock mappers.

use rustc_hash::FxHashSet;

use super::Expr;
use crate::core::mapper::{DepthMeter, Mapper, NodeCounter, VariableCollector};

impl Expr {
    /// Count the total number of nodes in the tree
    pub fn node_count(&self) -> usize {
        let Ok(count) = NodeCounter::default().rec(self);
        count
    }

    /// Get the maximum nesting depth of the tree (a leaf has depth 1)
    pub fn max_depth(&self) -> usize {
        let Ok(depth) = DepthMeter::default().rec(self);
        depth
    }

    /// Collect the free variable names of the tree
    pub fn variables(&self) -> FxHashSet<String> {
        let mut collector = VariableCollector::default();
        let Ok(()) = collector.rec(self);
        collector.variables
    }

    /// Check if the expression references a specific free variable
    pub fn contains_var(&self, var: &str) -> bool {
        self.variables().contains(var)
    }
}
