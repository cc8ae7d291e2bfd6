use std::time::Instant;

use anyhow::{Context, Result};

use crate::context::BuildContext;
use crate::passes::BuildPass;

/// Run every pass once, ordered by [`BuildPass::order`]. The sort is stable, so
/// passes sharing a slot keep their registration order. The first failure stops
/// the run; its error carries the failing pass in the context chain.
pub fn run_ordered(passes: &mut [Box<dyn BuildPass>], cx: &mut BuildContext<'_>) -> Result<()> {
    passes.sort_by_key(|p| p.order());
    let diagnostics = cx.config.diagnostics.clone();
    let started = Instant::now();

    for pass in passes.iter_mut() {
        let order = pass.order();
        let feature = pass.feature().to_string();
        cx.set_feature(&feature);
        if diagnostics.enabled {
            log::debug!("pass {order} ({feature})");
        }

        let pass_started = Instant::now();
        pass.run(cx)
            .with_context(|| format!("pass {order} ({feature})"))?;
        let claimed = cx.claim_unowned_layers();
        if claimed > 0 && diagnostics.enabled {
            log::debug!("{feature} added {claimed} layers");
        }

        if diagnostics.record_timings {
            let elapsed = pass_started.elapsed().as_secs_f32() * 1000.0;
            *cx.report
                .timings_ms
                .entry(format!("{order}_ms"))
                .or_insert(0.0) += elapsed;
        }
    }

    if diagnostics.record_timings {
        cx.report
            .timings_ms
            .insert("total_ms".to_string(), started.elapsed().as_secs_f32() * 1000.0);
    }
    cx.set_feature("");
    Ok(())
}
