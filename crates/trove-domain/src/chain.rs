//! Provenance chains: a value plus the ordered steps that produced it

use crate::error::{ChainError, Result};
use crate::lineage::{LineagePolicy, LineageSource};
use crate::record::{RecordInfo, RecordOrigin, TransformRecord};
use crate::transform::Transform;
use crate::value::{DataValue, Parameters};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// One request to apply a transform to a chain.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use trove_domain::{DataValue, Invocation, NoLineage, ProvenanceChain, Transform};
///
/// let repeat = Arc::new(Transform::new("repeat", 1, "repeat text n times", |value, params| {
///     let n = params.get("n").and_then(|v| v.as_u64()).unwrap_or(1) as usize;
///     Ok(DataValue::Text(value.as_text().unwrap_or_default().repeat(n)))
/// }));
///
/// let raw = ProvenanceChain::new(DataValue::from("ab"));
/// let doubled = raw
///     .transform(&Invocation::new(repeat).with_tag("double").with_param("n", 2), &NoLineage)
///     .unwrap();
///
/// assert_eq!(doubled.value(), &DataValue::from("abab"));
/// assert_eq!(raw.steps().len(), 0);
/// assert_eq!(doubled.steps().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Transform to apply
    pub transform: Arc<Transform>,
    /// Short label for the step
    pub tag: String,
    /// Keyword parameters passed to the transform
    pub parameters: Parameters,
    /// Whether a clean lineage is required
    pub policy: LineagePolicy,
}

impl Invocation {
    /// Invoke a transform with no tag, no parameters and the default policy
    pub fn new(transform: Arc<Transform>) -> Self {
        Self {
            transform,
            tag: String::new(),
            parameters: Parameters::new(),
            policy: LineagePolicy::default(),
        }
    }

    /// Set the step tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    /// Add a keyword parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Replace all parameters
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the lineage policy
    pub fn with_policy(mut self, policy: LineagePolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// A data value and the history of how it was produced.
///
/// Steps are append-only. [`ProvenanceChain::transform`] returns a new chain
/// and leaves `self` untouched, so branching from any point is safe.
#[derive(Debug, Clone)]
pub struct ProvenanceChain {
    steps: Vec<TransformRecord>,
    value: DataValue,
}

impl ProvenanceChain {
    /// Wrap a value with an empty history
    pub fn new(value: DataValue) -> Self {
        Self {
            steps: Vec::new(),
            value,
        }
    }

    /// Wrap a value read from a file, rooted at a source-file record
    pub fn with_source(value: DataValue, path: impl Into<PathBuf>) -> Self {
        Self {
            steps: vec![TransformRecord::source_file(path.into())],
            value,
        }
    }

    /// Assemble a chain from already-built records
    pub fn from_parts(value: DataValue, steps: Vec<TransformRecord>) -> Self {
        Self { steps, value }
    }

    /// Current value
    pub fn value(&self) -> &DataValue {
        &self.value
    }

    /// Consume the chain, returning its value
    pub fn into_value(self) -> DataValue {
        self.value
    }

    /// Steps in application order
    pub fn steps(&self) -> &[TransformRecord] {
        &self.steps
    }

    /// The most recent step
    pub fn last_step(&self) -> Option<&TransformRecord> {
        self.steps.last()
    }

    /// Apply a transform, producing a new chain with one more Live step
    pub fn transform(&self, invocation: &Invocation, lineage: &dyn LineageSource) -> Result<Self> {
        let state = lineage.resolve()?;
        let lineage_hash = invocation.policy.enforce(&state)?;

        let value = invocation
            .transform
            .apply(&self.value, &invocation.parameters)?;
        debug!(
            transform = %invocation.transform.reference(),
            tag = %invocation.tag,
            step = self.steps.len(),
            "applied transform"
        );

        let mut steps = self.steps.clone();
        steps.push(TransformRecord::live(
            Arc::clone(&invocation.transform),
            invocation.tag.clone(),
            lineage_hash,
            invocation.parameters.clone(),
        ));
        Ok(Self { steps, value })
    }

    /// Re-apply every recorded transform to a new input, in order
    pub fn rerun(&self, input: DataValue) -> Result<DataValue> {
        let mut replayable = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            match &step.origin {
                RecordOrigin::Live(t) | RecordOrigin::Replayed(t) => {
                    replayable.push((t, &step.parameters))
                }
                RecordOrigin::ReferenceOnly => {
                    return Err(ChainError::NotReplayable {
                        tag: step.tag.clone(),
                    })
                }
                RecordOrigin::SourceFile { .. } => {}
            }
        }
        if replayable.is_empty() {
            return Err(ChainError::EmptyChain);
        }

        let mut value = input;
        for (transform, parameters) in replayable {
            value = transform.apply(&value, parameters)?;
        }
        Ok(value)
    }

    /// Public fields of every record, in order
    pub fn describe(&self) -> Vec<RecordInfo> {
        self.steps.iter().map(TransformRecord::info).collect()
    }

    /// Human-readable listing of each step's code text
    pub fn code_listing(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            out.push_str(&format!("Step {}", i));
            if !step.tag.is_empty() {
                out.push_str(&format!(" ({})", step.tag));
            }
            out.push('\n');
            out.push_str(&"-".repeat(80));
            out.push('\n');
            out.push_str(&step.code_text);
            out.push_str("\n\n");
        }
        out
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::lineage::NoLineage;
    use proptest::prelude::*;

    fn wrap() -> Arc<Transform> {
        Arc::new(Transform::new("wrap", 1, "wrap in brackets", |v: &DataValue, p: &Parameters| {
            let left = p.get("left").and_then(|s| s.as_str()).unwrap_or("[");
            Ok(DataValue::Text(format!("{}{}]", left, v.as_text().unwrap_or_default())))
        }))
    }

    fn reverse() -> Arc<Transform> {
        Arc::new(Transform::new("reverse", 1, "reverse text", |v: &DataValue, _: &Parameters| {
            Ok(DataValue::Text(v.as_text().unwrap_or_default().chars().rev().collect()))
        }))
    }

    proptest! {
        /// Property: rerun equals applying each original transform by hand
        #[test]
        fn test_rerun_matches_manual_application(
            original in "[a-z]{0,12}",
            replacement in "[a-z]{0,12}",
            ops in proptest::collection::vec(any::<bool>(), 1..6),
        ) {
            let mut chain = ProvenanceChain::new(DataValue::Text(original));
            let mut invocations = Vec::new();
            for (i, use_wrap) in ops.iter().enumerate() {
                let invocation = if *use_wrap {
                    Invocation::new(wrap()).with_tag(format!("wrap{}", i)).with_param("left", "<")
                } else {
                    Invocation::new(reverse()).with_tag(format!("rev{}", i))
                };
                chain = chain.transform(&invocation, &NoLineage).unwrap();
                invocations.push(invocation);
            }

            let mut expected = DataValue::Text(replacement.clone());
            for invocation in &invocations {
                expected = invocation.transform.apply(&expected, &invocation.parameters).unwrap();
            }

            prop_assert_eq!(chain.rerun(DataValue::Text(replacement)).unwrap(), expected);
            prop_assert_eq!(chain.steps().len(), ops.len());
        }
    }
}
