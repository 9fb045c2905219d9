use sea_orm::{ActiveEnum, Iterable};

use super::{
    alert, escape_html, escape_opt, format_date, format_money, layout, AlertKind, Notice,
};
use crate::{
    auth::SessionUser,
    entities::{payment, PaymentMethod, PaymentType},
    forms::PaymentForm,
    services::payments::PaymentSummary,
};

pub const PAYMENTS_TITLE: &str = "إدارة المدفوعات";
pub const NO_PAYMENTS_MESSAGE: &str = "لا توجد مدفوعات";

fn summary_cards(summary: &PaymentSummary) -> String {
    let cards = [
        ("إجمالي المقبوضات", format_money(summary.total_received), "success"),
        ("إجمالي المدفوعات", format_money(summary.total_paid), "danger"),
        ("صافي التدفق النقدي", format_money(summary.net_flow), "primary"),
        ("عدد العمليات", summary.count().to_string(), "secondary"),
    ];

    cards
        .iter()
        .map(|(title, value, color)| {
            format!(
                r#"<div class="col-md-3 mb-3">
  <div class="card stats-card border-{color}">
    <div class="card-body text-center">
      <h6 class="text-muted">{title}</h6>
      <h4 class="text-{color} mb-0">{value}</h4>
    </div>
  </div>
</div>"#
            )
        })
        .collect()
}

fn payments_table(rows: &[payment::Model]) -> String {
    if rows.is_empty() {
        return alert(AlertKind::Info, NO_PAYMENTS_MESSAGE);
    }

    let body: String = rows
        .iter()
        .map(|p| {
            let type_class = match p.payment_type {
                PaymentType::Received => "bg-success",
                PaymentType::Paid => "bg-danger",
            };
            format!(
                r#"<tr>
  <td>{date}</td>
  <td>{party}</td>
  <td><span class="badge {type_class}">{kind}</span></td>
  <td>{method}</td>
  <td>{amount}</td>
  <td>{reference}</td>
  <td>{notes}</td>
  <td><form method="POST" action="/payments/{id}/delete" onsubmit="return confirm('هل أنت متأكد من الحذف؟');"><button class="btn btn-sm btn-outline-danger" type="submit">حذف</button></form></td>
</tr>"#,
                date = format_date(&p.date),
                party = escape_html(p.counterparty()),
                kind = p.payment_type.label(),
                method = p.payment_method.label(),
                amount = format_money(p.amount),
                reference = escape_opt(p.reference_number.as_deref()),
                notes = escape_opt(p.notes.as_deref()),
                id = p.id,
            )
        })
        .collect();

    format!(
        r#"<table class="table table-striped table-hover" id="paymentsTable">
  <thead><tr><th>التاريخ</th><th>الطرف</th><th>النوع</th><th>طريقة الدفع</th><th>المبلغ</th><th>المرجع</th><th>ملاحظات</th><th>إجراءات</th></tr></thead>
  <tbody>{body}</tbody>
</table>"#
    )
}

pub fn payments_page(
    user: &SessionUser,
    rows: &[payment::Model],
    summary: &PaymentSummary,
    notice: Option<Notice>,
) -> String {
    let body = format!(
        r#"<div class="d-flex justify-content-between align-items-center mb-3">
  <h2>{PAYMENTS_TITLE}</h2>
  <a href="/add_payment" class="btn btn-primary">دفعة جديدة</a>
</div>
{notice}
<div class="row">{cards}</div>
<div class="card"><div class="card-body">{table}</div></div>"#,
        notice = notice.map(|n| n.render()).unwrap_or_default(),
        cards = summary_cards(summary),
        table = payments_table(rows),
    );
    layout("المدفوعات", Some(user), &body)
}

/// `invoices` are `(id, invoice_number)` pairs
pub fn payment_form(
    user: &SessionUser,
    invoices: &[(i32, String)],
    error: Option<&str>,
    values: Option<&PaymentForm>,
) -> String {
    let selected_invoice = values.and_then(|v| v.invoice_id.as_deref()).unwrap_or("");
    let invoice_options: String = invoices
        .iter()
        .map(|(id, number)| {
            let selected = if id.to_string() == selected_invoice {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{id}"{selected}>{}</option>"#,
                escape_html(number)
            )
        })
        .collect();

    let chosen_method = values
        .and_then(|v| v.payment_method.as_deref())
        .and_then(PaymentMethod::parse)
        .unwrap_or(PaymentMethod::Cash);
    let methods: String = PaymentMethod::iter()
        .map(|m| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                m.to_value(),
                if m == chosen_method { " selected" } else { "" },
                m.label()
            )
        })
        .collect();

    let chosen_type = values
        .and_then(|v| v.payment_type.as_deref())
        .and_then(PaymentType::parse)
        .unwrap_or(PaymentType::Received);
    let types: String = PaymentType::iter()
        .map(|t| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                t.to_value(),
                if t == chosen_type { " selected" } else { "" },
                t.label()
            )
        })
        .collect();

    let value = |f: fn(&PaymentForm) -> Option<&str>| {
        values.and_then(f).map(escape_html).unwrap_or_default()
    };

    let body = format!(
        r#"<h2>دفعة جديدة</h2>
{error}
<div class="card"><div class="card-body">
<form method="POST" action="/add_payment">
  <div class="row g-3">
    <div class="col-md-4">
      <label class="form-label">نوع الدفعة</label>
      <select class="form-select" name="payment_type">{types}</select>
    </div>
    <div class="col-md-4">
      <label class="form-label">طريقة الدفع</label>
      <select class="form-select" name="payment_method">{methods}</select>
    </div>
    <div class="col-md-4">
      <label class="form-label">المبلغ</label>
      <input class="form-control" type="number" step="0.01" min="0.01" name="amount" value="{amount}" required>
    </div>
    <div class="col-md-4">
      <label class="form-label">التاريخ</label>
      <input class="form-control" type="date" name="date" value="{date}">
    </div>
    <div class="col-md-4">
      <label class="form-label">العميل</label>
      <input class="form-control" name="customer_name" value="{customer}">
    </div>
    <div class="col-md-4">
      <label class="form-label">المورد</label>
      <input class="form-control" name="supplier_name" value="{supplier}">
    </div>
    <div class="col-md-4">
      <label class="form-label">الفاتورة</label>
      <select class="form-select" name="invoice_id">
        <option value="">-- بدون فاتورة --</option>
        {invoice_options}
      </select>
    </div>
    <div class="col-md-4">
      <label class="form-label">رقم المرجع</label>
      <input class="form-control" name="reference_number" value="{reference}">
    </div>
    <div class="col-md-4">
      <label class="form-label">ملاحظات</label>
      <input class="form-control" name="notes" value="{notes}">
    </div>
  </div>
  <div class="mt-3">
    <button type="submit" class="btn btn-primary">حفظ الدفعة</button>
    <a href="/payments" class="btn btn-outline-secondary">إلغاء</a>
  </div>
</form>
</div></div>"#,
        error = error.map(|e| alert(AlertKind::Danger, e)).unwrap_or_default(),
        amount = value(|v| Some(v.amount.as_str())),
        date = value(|v| v.date.as_deref()),
        customer = value(|v| v.customer_name.as_deref()),
        supplier = value(|v| v.supplier_name.as_deref()),
        reference = value(|v| v.reference_number.as_deref()),
        notes = value(|v| v.notes.as_deref()),
    );
    layout("دفعة جديدة", Some(user), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn user() -> SessionUser {
        SessionUser {
            user_id: 1,
            username: "admin".into(),
            full_name: "مدير النظام".into(),
        }
    }

    #[test]
    fn empty_page_shows_message_instead_of_table() {
        let html = payments_page(&user(), &[], &PaymentSummary::default(), None);
        assert!(html.contains(NO_PAYMENTS_MESSAGE));
        assert!(!html.contains("paymentsTable"));
        assert!(!html.contains("alert-danger"));
        assert!(html.contains(&format!("<h2>{}</h2>", PAYMENTS_TITLE)));
    }

    #[test]
    fn payments_render_one_row_each() {
        let rows: Vec<payment::Model> = (1..=3)
            .map(|id| payment::Model {
                id,
                date: Utc::now(),
                amount: dec!(100),
                payment_method: PaymentMethod::BankTransfer,
                payment_type: PaymentType::Paid,
                reference_number: Some(format!("PAY-{}", 2000 + id)),
                invoice_id: None,
                customer_name: None,
                supplier_name: Some("مورد <1>".into()),
                notes: None,
                created_at: Utc::now(),
            })
            .collect();
        let summary = PaymentSummary::from_payments(&rows);
        let html = payments_page(&user(), &rows, &summary, None);

        assert!(html.contains(r#"id="paymentsTable""#));
        assert_eq!(html.matches("<tr>").count(), 1 + 3);
        assert!(html.contains("مورد &lt;1&gt;"));
        assert!(html.contains("تحويل بنكي"));
        assert_eq!(html.matches(r#"class="card stats-card"#).count(), 4);
    }
}
