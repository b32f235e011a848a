mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use tienda_admin_api::{
    dto::{
        orders::{CreateOrderRequest, OrderLineInput},
        reports::GenerateReportRequest,
    },
    entity::report_lines::{Column as ReportLineCol, Entity as ReportLines},
    error::AppError,
    middleware::auth::AuthUser,
    services::{order_service, report_service},
};

fn report_request(report_type: &str) -> GenerateReportRequest {
    GenerateReportRequest {
        report_type: report_type.to_string(),
        order_ids: None,
        start: None,
        end: None,
        notes: None,
    }
}

#[tokio::test]
async fn report_generation_and_queries_flow() -> anyhow::Result<()> {
    let Some(state) = common::setup_state().await? else {
        return Ok(());
    };

    let admin_id = common::create_user(&state, "admin", "admin@test.dev", "admin").await?;
    let buyer_id = common::create_user(&state, "buyer", "buyer@test.dev", "user").await?;
    let admin = AuthUser {
        user_id: admin_id,
        role: "admin".into(),
    };
    let buyer = AuthUser {
        user_id: buyer_id,
        role: "user".into(),
    };

    let category_id = common::create_category(&state, "Shoes").await?;
    let product_id =
        common::create_product(&state, category_id, "Boots", Decimal::new(1000, 2), 50).await?;

    let mut order_ids = Vec::new();
    for quantity in [1, 2] {
        let created = order_service::create_order(
            &state,
            &buyer,
            CreateOrderRequest {
                lines: vec![OrderLineInput {
                    product_id,
                    quantity,
                    unit_price: Decimal::new(1000, 2),
                }],
            },
        )
        .await?
        .data.unwrap();
        order_ids.push(created.order.id);
    }

    // Generation is an admin concern.
    let err = report_service::generate_report(&state, &buyer, report_request("sales"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let err = report_service::generate_report(&state, &admin, report_request("   "))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Explicit selection must name known orders only, and at least one.
    let err = report_service::generate_report(
        &state,
        &admin,
        GenerateReportRequest {
            order_ids: Some(vec![]),
            ..report_request("sales")
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = report_service::generate_report(
        &state,
        &admin,
        GenerateReportRequest {
            order_ids: Some(vec![order_ids[0], Uuid::new_v4()]),
            ..report_request("sales")
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // 10.00 + 20.00 across two orders; lines are positioned by order
    // creation time even when the ids arrive shuffled.
    let report = report_service::generate_report(
        &state,
        &admin,
        GenerateReportRequest {
            order_ids: Some(order_ids.iter().rev().copied().collect()),
            notes: Some("month close".into()),
            ..report_request("sales")
        },
    )
    .await?
    .data.unwrap();
    assert_eq!(report.report.total_orders, 2);
    assert_eq!(report.report.total_sales, Decimal::new(3000, 2));
    assert_eq!(report.report.user_id, Some(admin_id));
    assert_eq!(report.lines.len(), 2);
    assert_eq!(
        report.lines.iter().map(|l| l.amount).sum::<Decimal>(),
        Decimal::new(3000, 2)
    );
    assert_eq!(
        report.lines.iter().map(|l| l.position).collect::<Vec<_>>(),
        vec![0, 1]
    );
    assert_eq!(report.lines[0].amount, Decimal::new(1000, 2));
    assert_eq!(report.lines[1].amount, Decimal::new(2000, 2));

    // Range selection over the orders' creation day finds the same set.
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let ranged = report_service::generate_report(
        &state,
        &admin,
        GenerateReportRequest {
            start: Some(today.clone()),
            end: Some(today.clone()),
            ..report_request("daily")
        },
    )
    .await?
    .data.unwrap();
    assert_eq!(ranged.report.total_orders, 2);

    // Malformed or inverted bounds are rejected before any write.
    for (start, end) in [
        (None, Some(today.clone())),
        (Some(today.clone()), None),
        (Some("27-08-2026".to_string()), Some(today.clone())),
        (Some(today.clone()), Some("2020-01-01".to_string())),
    ] {
        let err = report_service::generate_report(
            &state,
            &admin,
            GenerateReportRequest {
                start,
                end,
                ..report_request("daily")
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    // The inclusive window covers today, and an older window is empty.
    let in_window =
        report_service::reports_by_range(&state, &admin, Some(today.as_str()), Some(today.as_str()))
            .await?
            .data.unwrap();
    assert_eq!(in_window.items.len(), 2);
    assert!(
        in_window
            .items
            .windows(2)
            .all(|w| w[0].generated_at >= w[1].generated_at)
    );

    let old_start = (Utc::now().date_naive() - Duration::days(30))
        .format("%Y-%m-%d")
        .to_string();
    let old_end = (Utc::now().date_naive() - Duration::days(1))
        .format("%Y-%m-%d")
        .to_string();
    let out_of_window = report_service::reports_by_range(
        &state,
        &admin,
        Some(old_start.as_str()),
        Some(old_end.as_str()),
    )
    .await?
    .data.unwrap();
    assert!(out_of_window.items.is_empty());

    // Per-user queries: two for the admin, an empty list for a stranger.
    let mine = report_service::reports_by_user(&state, &admin, admin_id)
        .await?
        .data.unwrap();
    assert_eq!(mine.items.len(), 2);
    let nobody = report_service::reports_by_user(&state, &admin, Uuid::new_v4())
        .await?
        .data.unwrap();
    assert!(nobody.items.is_empty());

    // The listing resolves the generating username.
    let listing = report_service::list_reports(&state, &admin).await?.data.unwrap();
    assert_eq!(listing.items.len(), 2);
    assert!(
        listing
            .items
            .iter()
            .all(|s| s.username.as_deref() == Some("admin"))
    );

    // Detail round trip and a miss.
    let detail = report_service::report_detail(&state, &admin, report.report.id)
        .await?
        .data.unwrap();
    assert_eq!(detail.lines.len(), 2);
    assert_eq!(
        detail.lines.iter().map(|l| l.position).collect::<Vec<_>>(),
        vec![0, 1]
    );
    let err = report_service::report_detail(&state, &admin, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Deleting a report takes its lines with it.
    report_service::delete_report(&state, &admin, report.report.id).await?;
    let orphan_lines = ReportLines::find()
        .filter(ReportLineCol::ReportId.eq(report.report.id))
        .count(&state.orm)
        .await?;
    assert_eq!(orphan_lines, 0);
    let err = report_service::delete_report(&state, &admin, report.report.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}
