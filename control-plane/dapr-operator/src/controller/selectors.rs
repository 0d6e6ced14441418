use std::fmt;

use tracing::trace;

use super::label_selector::{Operator, Requirement, RequirementError, Selector};
use super::labels::{
    RELEASE_GENERATION, RELEASE_NAME, RELEASE_NAMESPACE, ReleaseIdentity,
    encode_generation,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementPart {
    Namespace,
    Name,
    Generation,
}

impl fmt::Display for RequirementPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequirementPart::Namespace => write!(f, "namespace"),
            RequirementPart::Name => write!(f, "name"),
            RequirementPart::Generation => write!(f, "generation"),
        }
    }
}

/// A release selector could not be built. Never recovered from by
/// dropping the requirement: a selector missing a term matches more.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot determine release {part} requirement: {source}")]
pub struct SelectorError {
    pub part: RequirementPart,
    #[source]
    pub source: RequirementError,
}

impl SelectorError {
    fn at(part: RequirementPart) -> impl Fn(RequirementError) -> Self {
        move |source| SelectorError { part, source }
    }
}

/// Dependents of `release` rendered under an older generation; the GC set.
pub fn stale_selector(
    release: &ReleaseIdentity,
) -> Result<Selector, SelectorError> {
    let selector = generation_selector(release, Operator::LessThan)?;
    trace!(%release, %selector, "built stale selector");
    Ok(selector)
}

/// Dependents of `release` rendered under exactly its current generation.
pub fn current_selector(
    release: &ReleaseIdentity,
) -> Result<Selector, SelectorError> {
    let selector = generation_selector(release, Operator::Equals)?;
    trace!(%release, %selector, "built current selector");
    Ok(selector)
}

/// Anything owned by any release, whatever its generation.
pub fn release_selector() -> Result<Selector, SelectorError> {
    let name = Requirement::exists(RELEASE_NAME)
        .map_err(SelectorError::at(RequirementPart::Name))?;
    let namespace = Requirement::exists(RELEASE_NAMESPACE)
        .map_err(SelectorError::at(RequirementPart::Namespace))?;

    Ok(Selector::new().add(name).add(namespace))
}

fn generation_selector(
    release: &ReleaseIdentity,
    op: Operator,
) -> Result<Selector, SelectorError> {
    let namespace = Requirement::equals(RELEASE_NAMESPACE, &release.namespace)
        .map_err(SelectorError::at(RequirementPart::Namespace))?;
    let name = Requirement::equals(RELEASE_NAME, &release.name)
        .map_err(SelectorError::at(RequirementPart::Name))?;
    let generation = Requirement::new(
        RELEASE_GENERATION,
        op,
        [encode_generation(release.generation)],
    )
    .map_err(SelectorError::at(RequirementPart::Generation))?;

    Ok(Selector::new().add(namespace).add(name).add(generation))
}
