use crate::entities::{
    CategoryTotals, TicketBreakdown, TicketDetail, TicketSummary, TransactionRecord,
    TransactionView,
};

pub fn summarize_tickets(details: &[TicketDetail]) -> TicketSummary {
    let mut summary = TicketSummary {
        total_tickets: details.iter().map(|detail| detail.quantity).sum(),
        total_categories: details.len() as u32,
        ..TicketSummary::default()
    };
    // lines sharing a category name fold into one entry; the first line's
    // unit price is kept
    for detail in details {
        summary
            .breakdown
            .entry(detail.category_name.clone())
            .and_modify(|totals| {
                totals.quantity = totals.quantity.saturating_add(detail.quantity);
                totals.subtotal += detail.subtotal;
            })
            .or_insert(CategoryTotals {
                quantity: detail.quantity,
                unit_price: detail.unit_price,
                subtotal: detail.subtotal,
            });
    }
    summary
}

impl From<TransactionRecord> for TransactionView {
    fn from(record: TransactionRecord) -> Self {
        let summary = summarize_tickets(&record.details);
        TransactionView {
            header: record.header,
            event: record.event,
            venue: record.venue,
            purchaser: record.purchaser,
            tickets: TicketBreakdown {
                details: record.details,
                summary,
            },
        }
    }
}
