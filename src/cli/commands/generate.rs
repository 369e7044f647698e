use anyhow::Result;
use compute::{GenerationResult, RecurringBillService};
use tracing::{info, instrument};

#[instrument(skip(service))]
pub async fn generate(
    service: &RecurringBillService,
    tenant_id: i32,
    bill_id: i32,
    periods: u32,
) -> Result<GenerationResult> {
    let result = service.generate(bill_id, tenant_id, periods).await?;
    info!(generated = result.generated, skipped = result.skipped, "Generation done");
    Ok(result)
}
