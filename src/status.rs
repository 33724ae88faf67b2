use std::{collections::HashSet, fmt};

/// Review state of a pull request, derived from its labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    NoLabels,
    PendingReview,
    ReadyForMerge,
    ReadyForQa,
    Open,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NoLabels => "No labels!",
            Status::PendingReview => "Pending review",
            Status::ReadyForMerge => "Ready for merge",
            Status::ReadyForQa => "Ready for QA",
            Status::Open => "Open",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three label vocabularies that drive classification.
///
/// `inclusive` is the union of the other three and is computed once at
/// construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelRules {
    review: HashSet<String>,
    qa: HashSet<String>,
    merge: HashSet<String>,
    inclusive: HashSet<String>,
}

impl LabelRules {
    pub fn new<R, Q, M>(review: R, qa: Q, merge: M) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        Q: IntoIterator,
        Q::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        let review: HashSet<String> = review.into_iter().map(Into::into).collect();
        let qa: HashSet<String> = qa.into_iter().map(Into::into).collect();
        let merge: HashSet<String> = merge.into_iter().map(Into::into).collect();
        let inclusive = review
            .iter()
            .chain(qa.iter())
            .chain(merge.iter())
            .cloned()
            .collect();

        Self {
            review,
            qa,
            merge,
            inclusive,
        }
    }

    pub fn review(&self) -> &HashSet<String> {
        &self.review
    }

    pub fn qa(&self) -> &HashSet<String> {
        &self.qa
    }

    pub fn merge(&self) -> &HashSet<String> {
        &self.merge
    }

    pub fn inclusive(&self) -> &HashSet<String> {
        &self.inclusive
    }

    /// Classifies a label set. The order of the checks is the policy:
    /// review wins over merge, merge wins over QA.
    pub fn classify<S: AsRef<str>>(&self, labels: &[S]) -> Status {
        if labels.is_empty() {
            Status::NoLabels
        } else if intersects(labels, &self.review) {
            Status::PendingReview
        } else if intersects(labels, &self.merge) {
            Status::ReadyForMerge
        } else if intersects(labels, &self.qa) {
            Status::ReadyForQa
        } else {
            Status::Open
        }
    }

    /// Unlabelled pull requests always pass; labelled ones need at least one
    /// tracked label.
    pub fn is_tracked<S: AsRef<str>>(&self, labels: &[S]) -> bool {
        labels.is_empty() || intersects(labels, &self.inclusive)
    }
}

fn intersects<S: AsRef<str>>(labels: &[S], set: &HashSet<String>) -> bool {
    labels.iter().any(|label| set.contains(label.as_ref()))
}
