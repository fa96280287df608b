//! Explain output
//!
//! Deterministic, human-readable rendering of a compiled plan or of the
//! reason a Token was rejected.

use std::fmt;

use super::errors::BuildError;
use super::plan::{PaginationDirective, QueryPlan, ScanDirection};

/// Explain plan output
#[derive(Debug, Clone, PartialEq)]
pub struct ExplainPlan {
    /// Whether compilation succeeded
    pub accepted: bool,
    pub source: Option<String>,
    /// Rendered predicate tree
    pub predicate: Option<String>,
    /// Rendered keyset seek
    pub seek: Option<String>,
    pub order: Vec<String>,
    pub joins: Vec<String>,
    /// Rendered pagination directive
    pub pagination: Option<String>,
    pub params: Vec<String>,
    /// Nested explains, one per preload, rendered as `assoc: ...`
    pub preloads: Vec<(String, ExplainPlan)>,
    /// Rejection reason (if rejected)
    pub rejection_reason: Option<String>,
    /// Rejection error code (if rejected)
    pub rejection_code: Option<String>,
}

impl ExplainPlan {
    /// Creates an explain plan from a compiled plan
    pub fn from_plan(plan: &QueryPlan) -> Self {
        let pagination = plan.pagination.as_ref().map(|p| match p {
            PaginationDirective::Offset { limit, offset } => {
                format!("offset limit={} offset={}", limit, offset)
            }
            PaginationDirective::Cursor {
                limit,
                scan,
                resumed,
                ..
            } => format!(
                "cursor limit={} scan={} resumed={}",
                limit,
                match scan {
                    ScanDirection::Forward => "forward",
                    ScanDirection::Backward => "backward",
                },
                resumed
            ),
        });

        Self {
            accepted: true,
            source: Some(plan.source.clone()),
            predicate: plan.predicate.as_ref().map(|p| p.to_string()),
            seek: plan.seek.as_ref().map(|p| p.to_string()),
            order: plan.order_list.iter().map(|o| o.to_string()).collect(),
            joins: plan
                .join_list
                .iter()
                .map(|j| format!("{} {} AS {}", j.kind.as_str(), j.target, j.binding))
                .collect(),
            pagination,
            params: plan.params.iter().map(|p| p.to_string()).collect(),
            preloads: plan
                .preloads
                .iter()
                .map(|p| (p.assoc.clone(), ExplainPlan::from_plan(&p.plan)))
                .collect(),
            rejection_reason: None,
            rejection_code: None,
        }
    }

    /// Creates an explain plan from a build error
    pub fn from_error(err: &BuildError) -> Self {
        Self {
            accepted: false,
            source: None,
            predicate: None,
            seek: None,
            order: Vec::new(),
            joins: Vec::new(),
            pagination: None,
            params: Vec::new(),
            preloads: Vec::new(),
            rejection_reason: Some(err.to_string()),
            rejection_code: Some(err.code().to_string()),
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, indent: usize) -> fmt::Result {
        let pad = " ".repeat(indent);
        if !self.accepted {
            writeln!(f, "{}Status: REJECTED", pad)?;
            if let Some(code) = &self.rejection_code {
                writeln!(f, "{}Code: {}", pad, code)?;
            }
            if let Some(reason) = &self.rejection_reason {
                writeln!(f, "{}Reason: {}", pad, reason)?;
            }
            return Ok(());
        }

        writeln!(f, "{}Status: ACCEPTED", pad)?;
        if let Some(source) = &self.source {
            writeln!(f, "{}Source: {}", pad, source)?;
        }
        for join in &self.joins {
            writeln!(f, "{}Join: {}", pad, join)?;
        }
        if let Some(predicate) = &self.predicate {
            writeln!(f, "{}Predicate: {}", pad, predicate)?;
        }
        if let Some(seek) = &self.seek {
            writeln!(f, "{}Seek: {}", pad, seek)?;
        }
        if !self.order.is_empty() {
            writeln!(f, "{}Order: {}", pad, self.order.join(", "))?;
        }
        if let Some(pagination) = &self.pagination {
            writeln!(f, "{}Pagination: {}", pad, pagination)?;
        }
        for (i, param) in self.params.iter().enumerate() {
            writeln!(f, "{}  ${} = {}", pad, i + 1, param)?;
        }
        for (assoc, nested) in &self.preloads {
            writeln!(f, "{}Preload {}:", pad, assoc)?;
            nested.render(f, indent + 2)?;
        }
        Ok(())
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN PLAN ===")?;
        self.render(f, 0)
    }
}
