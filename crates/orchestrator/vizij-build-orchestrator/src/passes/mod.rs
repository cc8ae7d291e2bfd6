pub mod builtin;

use anyhow::Result;

use crate::context::BuildContext;
use crate::order::FeatureOrder;

pub use builtin::builtin_passes;

/// One step of a build. The pipeline runs each registered pass exactly once, in
/// [`FeatureOrder`], with exclusive access to the context.
pub trait BuildPass {
    /// Owner identifier recorded for layers and resting clips this pass adds.
    fn feature(&self) -> &str;
    fn order(&self) -> FeatureOrder;
    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()>;
}

/// A pass built from a closure, for host features that don't need their own type.
pub struct FnPass<F> {
    feature: String,
    order: FeatureOrder,
    f: F,
}

impl<F> FnPass<F>
where
    F: FnMut(&mut BuildContext<'_>) -> Result<()>,
{
    pub fn new(feature: impl Into<String>, order: FeatureOrder, f: F) -> Self {
        Self {
            feature: feature.into(),
            order,
            f,
        }
    }
}

impl<F> BuildPass for FnPass<F>
where
    F: FnMut(&mut BuildContext<'_>) -> Result<()>,
{
    fn feature(&self) -> &str {
        &self.feature
    }

    fn order(&self) -> FeatureOrder {
        self.order
    }

    fn run(&mut self, cx: &mut BuildContext<'_>) -> Result<()> {
        (self.f)(cx)
    }
}
