use std::collections::BTreeMap;

use anyhow::Result;
use compute::{BatchResult, RecurringBillService};
use serde::Serialize;
use tracing::{error, info, instrument};

/// What the job did for one tenant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TenantRun {
    pub tenant_id: i32,
    pub generation: Option<BatchResult>,
    pub overdue_marked: Option<u64>,
    pub errors: Vec<String>,
}

/// Printed at the end of a job run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobSummary {
    pub tenants: Vec<TenantRun>,
    pub total_generated: u32,
    pub total_overdue: u64,
    pub failed_tenants: usize,
}

impl JobSummary {
    fn record(&mut self, run: TenantRun) {
        self.total_generated += run.generation.as_ref().map_or(0, |g| g.total_generated);
        self.total_overdue += run.overdue_marked.unwrap_or(0);
        if !run.errors.is_empty() {
            self.failed_tenants += 1;
        }
        self.tenants.push(run);
    }
}

/// Daily sweep: top up occurrences of tenants with active bills, then mark
/// overdue ones, tenant by tenant. A failing tenant is reported and the
/// sweep moves on.
#[instrument(skip(service))]
pub async fn run_daily(service: &RecurringBillService) -> Result<JobSummary> {
    let mut runs = BTreeMap::new();

    for tenant_id in service.tenants_with_active_bills().await? {
        let mut run = TenantRun {
            tenant_id,
            ..Default::default()
        };

        match service.generate_all_for_tenant(tenant_id).await {
            Ok(batch) => {
                run.errors.extend(batch.errors.iter().cloned());
                run.generation = Some(batch);
            }
            Err(e) => {
                error!(tenant_id, error = %e, "Occurrence generation failed");
                run.errors.push(format!("generation: {}", e));
            }
        }
        runs.insert(tenant_id, run);
    }

    // Paused and ended bills still leave pending occurrences behind
    for tenant_id in service.tenants_with_past_due_occurrences().await? {
        runs.entry(tenant_id).or_insert_with(|| TenantRun {
            tenant_id,
            ..Default::default()
        });
    }

    let mut summary = JobSummary::default();
    for mut run in runs.into_values() {
        reconcile_into(service, &mut run).await;
        summary.record(run);
    }

    info!(
        tenants = summary.tenants.len(),
        generated = summary.total_generated,
        overdue = summary.total_overdue,
        failed = summary.failed_tenants,
        "Daily run finished"
    );
    Ok(summary)
}

/// Overdue check only, for runs between the daily sweeps.
#[instrument(skip(service))]
pub async fn reconcile_overdue(service: &RecurringBillService) -> Result<JobSummary> {
    let mut summary = JobSummary::default();

    for tenant_id in service.tenants_with_past_due_occurrences().await? {
        let mut run = TenantRun {
            tenant_id,
            ..Default::default()
        };
        reconcile_into(service, &mut run).await;
        summary.record(run);
    }

    info!(overdue = summary.total_overdue, "Overdue reconciliation finished");
    Ok(summary)
}

async fn reconcile_into(service: &RecurringBillService, run: &mut TenantRun) {
    match service.reconcile_overdue(run.tenant_id).await {
        Ok(marked) => run.overdue_marked = Some(marked),
        Err(e) => {
            error!(tenant_id = run.tenant_id, error = %e, "Overdue reconciliation failed");
            run.errors.push(format!("overdue: {}", e));
        }
    }
}
