//! `mfetch run <BASE>` – fetch a run to completion or until stopped.

use anyhow::{Context, Result};
use mfetch_core::callbacks::FollowRedirects;
use mfetch_core::config::FetchConfig;
use mfetch_core::interface::InterfaceSpec;
use mfetch_core::layout::RunLayout;
use mfetch_core::queue::AddOutcome;
use mfetch_core::scheduler::RunStats;
use mfetch_core::{RunOutcome, Scheduler};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crate::cli::RunArgs;

const PROGRESS_INTERVAL_MS: u64 = 500;

/// One interface per `--interface`, or a single default-route interface when
/// only proxy or tuning flags are given. Empty when nothing was requested.
pub(crate) fn interface_specs(args: &RunArgs) -> Vec<InterfaceSpec> {
    let tuned = args.proxy.is_some() || args.max_conns.is_some() || args.no_adaptive;
    let mut bases: Vec<InterfaceSpec> = args
        .interfaces
        .iter()
        .map(|addr| InterfaceSpec::local().address(addr.clone()))
        .collect();
    if bases.is_empty() && tuned {
        bases.push(InterfaceSpec::local());
    }
    bases
        .into_iter()
        .map(|mut spec| {
            if let Some(proxy) = &args.proxy {
                spec = spec.proxy(proxy.clone(), args.proxy_auth.clone());
            }
            if let Some(n) = args.max_conns {
                spec = spec.max_conns(n);
            }
            if args.no_adaptive {
                spec = spec.adaptive(false);
            }
            spec
        })
        .collect()
}

pub async fn run_fetch(mut cfg: FetchConfig, args: RunArgs) -> Result<()> {
    if let Some(n) = args.max_retry {
        cfg.max_retry = n;
    }
    let layout = RunLayout::new(&args.base);
    let specs = interface_specs(&args);

    let abort = Arc::new(AtomicBool::new(false));
    let ctrl_c = Arc::clone(&abort);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nstopping, saving state...");
            ctrl_c.store(true, Ordering::Relaxed);
        }
    });

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<RunStats>(16);
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(stats) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS {
                println!(
                    "\r  {} done ({} ok, {} retried, {} failed)  {} in flight  {:.1}/s  ",
                    stats.completed(),
                    stats.succeeded,
                    stats.retried,
                    stats.abandoned,
                    stats.in_flight,
                    stats.rate()
                );
                last_print = now;
            }
        }
    });

    let base = args.base.clone();
    let worker = tokio::task::spawn_blocking(move || -> Result<(RunOutcome, RunStats)> {
        let mut s = Scheduler::open(&base, &cfg)
            .with_context(|| format!("open run {}", base.display()))?;
        s.set_abort_token(abort);
        s.set_progress(progress_tx);
        for spec in specs {
            let key = spec.key();
            if !s.add_interface(spec) {
                tracing::info!("interface {} already registered", key);
            }
        }
        if args.follow_redirects {
            s.set_redirect_handler(FollowRedirects);
        }
        for url in &args.urls {
            match s.add_url(url, None) {
                AddOutcome::Duplicate => tracing::info!("{} already queued", url),
                AddOutcome::Ignored => tracing::info!("resuming, {} ignored", url),
                AddOutcome::Queued | AddOutcome::Spilled => {}
            }
        }
        let outcome = s.run()?;
        Ok((outcome, s.stats().clone()))
    });

    let (outcome, stats) = worker.await.context("fetch worker panicked")??;
    let _ = progress_handle.await;

    match outcome {
        RunOutcome::Completed => println!(
            "Completed: {} ok, {} failed, {} redirected, {} dropped ({} requests)",
            stats.succeeded, stats.abandoned, stats.redirected, stats.discarded, stats.dispatched
        ),
        RunOutcome::Interrupted => println!(
            "Interrupted after {} requests; state saved to {}",
            stats.dispatched,
            layout.recovery.display()
        ),
    }
    Ok(())
}
