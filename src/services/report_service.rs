use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::reports::{
        GenerateReportRequest, ReportList, ReportSummary, ReportSummaryList, ReportWithLines,
    },
    entity::{
        orders::{Column as OrderCol, Entity as Orders, Model as OrderModel},
        report_lines::{
            ActiveModel as ReportLineActive, Column as ReportLineCol, Entity as ReportLines,
            Model as ReportLineModel,
        },
        reports::{
            ActiveModel as ReportActive, Column as ReportCol, Entity as Reports,
            Model as ReportModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Report, ReportLine},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Aggregate a set of source orders into a persisted report with one line
/// per order.
pub async fn generate_report(
    state: &AppState,
    user: &AuthUser,
    payload: GenerateReportRequest,
) -> AppResult<ApiResponse<ReportWithLines>> {
    ensure_admin(user)?;

    let report_type = payload.report_type.trim();
    if report_type.is_empty() {
        return Err(AppError::Validation("report type is required".into()));
    }

    let txn = state.orm.begin().await?;

    let orders = select_source_orders(&txn, &payload).await?;
    if orders.is_empty() {
        return Err(AppError::Validation(
            "no source orders matched the selection".into(),
        ));
    }

    let total_sales: Decimal = orders
        .iter()
        .map(|o| o.total)
        .sum::<Decimal>()
        .round_dp(2);

    let report = ReportActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.user_id)),
        generated_at: NotSet,
        report_type: Set(report_type.to_string()),
        total_orders: Set(orders.len() as i32),
        total_sales: Set(total_sales),
        notes: Set(payload.notes.clone()),
    }
    .insert(&txn)
    .await?;

    let mut lines: Vec<ReportLine> = Vec::with_capacity(orders.len());
    for (position, order) in orders.iter().enumerate() {
        let line = ReportLineActive {
            id: Set(Uuid::new_v4()),
            report_id: Set(report.id),
            order_id: Set(Some(order.id)),
            position: Set(position as i32),
            description: Set(format!("order {} ({})", order.id, order.status)),
            amount: Set(order.total),
        }
        .insert(&txn)
        .await?;
        lines.push(report_line_from_entity(line));
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "report_generate",
        Some("reports"),
        Some(serde_json::json!({ "report_id": report.id, "orders": report.total_orders })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Report generated",
        ReportWithLines {
            report: report_from_entity(report),
            lines,
        },
        Some(Meta::empty()),
    ))
}

async fn select_source_orders<C: sea_orm::ConnectionTrait>(
    conn: &C,
    payload: &GenerateReportRequest,
) -> AppResult<Vec<OrderModel>> {
    if let Some(ids) = payload.order_ids.as_ref() {
        if ids.is_empty() {
            return Err(AppError::Validation("order_ids must not be empty".into()));
        }
        let orders = Orders::find()
            .filter(OrderCol::Id.is_in(ids.clone()))
            .order_by_asc(OrderCol::CreatedAt)
            .all(conn)
            .await?;
        if orders.len() != ids.len() {
            return Err(AppError::Validation(
                "order_ids contains unknown orders".into(),
            ));
        }
        return Ok(orders);
    }

    let (start, end) = parse_range(payload.start.as_deref(), payload.end.as_deref())?;
    let orders = Orders::find()
        .filter(OrderCol::CreatedAt.gte(start))
        .filter(OrderCol::CreatedAt.lt(end))
        .order_by_asc(OrderCol::CreatedAt)
        .all(conn)
        .await?;
    Ok(orders)
}

/// All reports, newest first, with the generating username resolved.
pub async fn list_reports(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ReportSummaryList>> {
    ensure_admin(user)?;

    let rows = Reports::find()
        .find_also_related(Users)
        .order_by_desc(ReportCol::GeneratedAt)
        .all(&state.orm)
        .await?;

    let items = rows
        .into_iter()
        .map(|(report, generator)| ReportSummary {
            report: report_from_entity(report),
            username: generator.map(|u| u.username),
        })
        .collect();

    Ok(ApiResponse::success(
        "Reports",
        ReportSummaryList { items },
        Some(Meta::empty()),
    ))
}

/// Reports whose generation timestamp falls within the inclusive
/// `[start, end]` calendar-date window, newest first.
pub async fn reports_by_range(
    state: &AppState,
    user: &AuthUser,
    start: Option<&str>,
    end: Option<&str>,
) -> AppResult<ApiResponse<ReportList>> {
    ensure_admin(user)?;

    let (start, end) = parse_range(start, end)?;

    let items = Reports::find()
        .filter(ReportCol::GeneratedAt.gte(start))
        .filter(ReportCol::GeneratedAt.lt(end))
        .order_by_desc(ReportCol::GeneratedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(report_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Reports",
        ReportList { items },
        Some(Meta::empty()),
    ))
}

/// Reports generated by one user, newest first. An empty list is not an
/// error.
pub async fn reports_by_user(
    state: &AppState,
    user: &AuthUser,
    target: Uuid,
) -> AppResult<ApiResponse<ReportList>> {
    ensure_admin(user)?;

    let items = Reports::find()
        .filter(ReportCol::UserId.eq(target))
        .order_by_desc(ReportCol::GeneratedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(report_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Reports",
        ReportList { items },
        Some(Meta::empty()),
    ))
}

pub async fn report_detail(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ReportWithLines>> {
    ensure_admin(user)?;

    let report = Reports::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let lines = ReportLines::find()
        .filter(ReportLineCol::ReportId.eq(report.id))
        .order_by_asc(ReportLineCol::Position)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(report_line_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Report",
        ReportWithLines {
            report: report_from_entity(report),
            lines,
        },
        Some(Meta::empty()),
    ))
}

/// Delete a report; its lines go with it through the cascade rule.
pub async fn delete_report(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let result = Reports::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "report_delete",
        Some("reports"),
        Some(serde_json::json!({ "report_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Parse an inclusive `YYYY-MM-DD` date pair into a `[start, end)` UTC
/// timestamp window covering the whole end day.
fn parse_range(
    start: Option<&str>,
    end: Option<&str>,
) -> AppResult<(chrono::DateTime<Utc>, chrono::DateTime<Utc>)> {
    let (start, end) = match (start, end) {
        (Some(s), Some(e)) => (s, e),
        _ => {
            return Err(AppError::Validation(
                "start and end dates are required (YYYY-MM-DD)".into(),
            ));
        }
    };

    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;
    if end_date < start_date {
        return Err(AppError::Validation("end date is before start date".into()));
    }

    let start_at = Utc.from_utc_datetime(&start_date.and_hms_opt(0, 0, 0).unwrap_or_default());
    let end_at = Utc.from_utc_datetime(&end_date.and_hms_opt(0, 0, 0).unwrap_or_default())
        + Duration::days(1);
    Ok((start_at, end_at))
}

fn parse_date(value: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date '{value}' (use YYYY-MM-DD)")))
}

pub fn report_from_entity(model: ReportModel) -> Report {
    Report {
        id: model.id,
        user_id: model.user_id,
        generated_at: model.generated_at.with_timezone(&Utc),
        report_type: model.report_type,
        total_orders: model.total_orders,
        total_sales: model.total_sales,
        notes: model.notes,
    }
}

pub fn report_line_from_entity(model: ReportLineModel) -> ReportLine {
    ReportLine {
        id: model.id,
        report_id: model.report_id,
        order_id: model.order_id,
        position: model.position,
        description: model.description,
        amount: model.amount,
    }
}
