use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{alert, escape_html, format_date, format_money, layout, AlertKind, Notice};
use crate::{
    auth::SessionUser,
    entities::{invoice, purchase_invoice, InvoiceStatus},
    forms::InvoiceForm,
};
use sea_orm::{ActiveEnum, Iterable};

/// Which side of the ledger an invoice page is about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceKind {
    Sales,
    Purchase,
}

impl InvoiceKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Sales => "فواتير المبيعات",
            Self::Purchase => "فواتير المشتريات",
        }
    }

    fn new_title(&self) -> &'static str {
        match self {
            Self::Sales => "فاتورة مبيعات جديدة",
            Self::Purchase => "فاتورة مشتريات جديدة",
        }
    }

    fn party_label(&self) -> &'static str {
        match self {
            Self::Sales => "العميل",
            Self::Purchase => "المورد",
        }
    }

    fn party_field(&self) -> &'static str {
        match self {
            Self::Sales => "customer",
            Self::Purchase => "supplier",
        }
    }

    pub fn list_path(&self) -> &'static str {
        match self {
            Self::Sales => "/sales_invoices",
            Self::Purchase => "/purchase_invoices",
        }
    }

    pub fn add_path(&self) -> &'static str {
        match self {
            Self::Sales => "/add_sales_invoice",
            Self::Purchase => "/add_purchase_invoice",
        }
    }

    fn table_id(&self) -> &'static str {
        match self {
            Self::Sales => "salesInvoicesTable",
            Self::Purchase => "purchaseInvoicesTable",
        }
    }
}

/// The columns shared by sales and purchase invoices
pub struct InvoiceRow<'a> {
    pub id: i32,
    pub number: &'a str,
    pub party: &'a str,
    pub date: &'a DateTime<Utc>,
    pub subtotal: Decimal,
    pub tax_amount: Decimal,
    pub discount: Decimal,
    pub total_amount: Decimal,
    pub status: InvoiceStatus,
}

impl<'a> From<&'a invoice::Model> for InvoiceRow<'a> {
    fn from(m: &'a invoice::Model) -> Self {
        Self {
            id: m.id,
            number: &m.invoice_number,
            party: &m.customer_name,
            date: &m.date,
            subtotal: m.subtotal,
            tax_amount: m.tax_amount,
            discount: m.discount,
            total_amount: m.total_amount,
            status: m.status,
        }
    }
}

impl<'a> From<&'a purchase_invoice::Model> for InvoiceRow<'a> {
    fn from(m: &'a purchase_invoice::Model) -> Self {
        Self {
            id: m.id,
            number: &m.invoice_number,
            party: &m.supplier_name,
            date: &m.date,
            subtotal: m.subtotal,
            tax_amount: m.tax_amount,
            discount: m.discount,
            total_amount: m.total_amount,
            status: m.status,
        }
    }
}

fn invoice_table(kind: InvoiceKind, rows: &[InvoiceRow<'_>], with_actions: bool) -> String {
    if rows.is_empty() {
        return format!(
            r#"<p class="text-muted text-center">لا توجد {}</p>"#,
            kind.title()
        );
    }

    let body: String = rows
        .iter()
        .map(|r| {
            let actions = if with_actions {
                format!(
                    r#"<td><form method="POST" action="{}/{}/delete" onsubmit="return confirm('هل أنت متأكد من الحذف؟');"><button class="btn btn-sm btn-outline-danger" type="submit">حذف</button></form></td>"#,
                    kind.list_path(),
                    r.id
                )
            } else {
                String::new()
            };
            format!(
                r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><span class="badge {}">{}</span></td>{}</tr>"#,
                escape_html(r.number),
                escape_html(r.party),
                format_date(r.date),
                format_money(r.subtotal),
                format_money(r.tax_amount),
                format_money(r.discount),
                format_money(r.total_amount),
                r.status.badge_class(),
                r.status.label(),
                actions,
            )
        })
        .collect();

    format!(
        r#"<table class="table table-striped table-hover" id="{table_id}">
  <thead><tr><th>رقم الفاتورة</th><th>{party}</th><th>التاريخ</th><th>المبلغ</th><th>الضريبة</th><th>الخصم</th><th>الإجمالي</th><th>الحالة</th>{actions}</tr></thead>
  <tbody>{body}</tbody>
</table>"#,
        table_id = kind.table_id(),
        party = kind.party_label(),
        actions = if with_actions { "<th>إجراءات</th>" } else { "" },
    )
}

pub fn invoice_list(
    user: &SessionUser,
    kind: InvoiceKind,
    rows: &[InvoiceRow<'_>],
    notice: Option<Notice>,
) -> String {
    let total: Decimal = rows.iter().map(|r| r.total_amount).sum();
    let body = format!(
        r#"<div class="d-flex justify-content-between align-items-center mb-3">
  <h2>{title}</h2>
  <a href="{add}" class="btn btn-primary">{new_title}</a>
</div>
{notice}
<div class="card stats-card mb-3"><div class="card-body">
  <span>عدد الفواتير: {count}</span> | <span>الإجمالي: {total}</span>
</div></div>
<div class="card"><div class="card-body">{table}</div></div>"#,
        title = kind.title(),
        add = kind.add_path(),
        new_title = kind.new_title(),
        notice = notice.map(|n| n.render()).unwrap_or_default(),
        count = rows.len(),
        total = format_money(total),
        table = invoice_table(kind, rows, true),
    );
    layout(kind.title(), Some(user), &body)
}

/// Sales and purchase invoices on one page
pub fn all_invoices(
    user: &SessionUser,
    sales: &[InvoiceRow<'_>],
    purchases: &[InvoiceRow<'_>],
) -> String {
    let body = format!(
        r#"<h2>الفواتير</h2>
<div class="card mb-4"><div class="card-body">
  <h4>{sales_title}</h4>
  {sales}
</div></div>
<div class="card"><div class="card-body">
  <h4>{purchase_title}</h4>
  {purchases}
</div></div>"#,
        sales_title = InvoiceKind::Sales.title(),
        sales = invoice_table(InvoiceKind::Sales, sales, false),
        purchase_title = InvoiceKind::Purchase.title(),
        purchases = invoice_table(InvoiceKind::Purchase, purchases, false),
    );
    layout("الفواتير", Some(user), &body)
}

/// New invoice form. `parties` are `(id, name)` pairs for the select box.
pub fn invoice_form(
    user: &SessionUser,
    kind: InvoiceKind,
    parties: &[(i32, String)],
    default_tax_percent: Decimal,
    error: Option<&str>,
    values: Option<&InvoiceForm>,
) -> String {
    let selected_party = values.and_then(|v| v.party_id.as_deref()).unwrap_or("");
    let options: String = parties
        .iter()
        .map(|(id, name)| {
            let selected = if id.to_string() == selected_party {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{id}"{selected}>{}</option>"#,
                escape_html(name)
            )
        })
        .collect();

    let selected_status = values
        .and_then(|v| v.status.as_deref())
        .and_then(InvoiceStatus::parse)
        .unwrap_or_default();
    let statuses: String = InvoiceStatus::iter()
        .map(|s| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                s.to_value(),
                if s == selected_status { " selected" } else { "" },
                s.label()
            )
        })
        .collect();

    let value = |f: fn(&InvoiceForm) -> Option<&str>| {
        values
            .and_then(f)
            .map(escape_html)
            .unwrap_or_default()
    };
    let tax_value = values
        .and_then(|v| v.tax_rate.as_deref())
        .filter(|v| !v.trim().is_empty())
        .map(escape_html)
        .unwrap_or_else(|| default_tax_percent.normalize().to_string());

    let body = format!(
        r#"<h2>{new_title}</h2>
{error}
<div class="card"><div class="card-body">
<form method="POST" action="{action}">
  <div class="row g-3">
    <div class="col-md-6">
      <label class="form-label">{party_label}</label>
      <select class="form-select" name="{field}_id">
        <option value="">-- اختر {party_label} --</option>
        {options}
      </select>
    </div>
    <div class="col-md-6">
      <label class="form-label">أو اسم {party_label}</label>
      <input class="form-control" name="{field}_name" value="{party_name}">
    </div>
    <div class="col-md-4">
      <label class="form-label">التاريخ</label>
      <input class="form-control" type="date" name="date" value="{date}">
    </div>
    <div class="col-md-4">
      <label class="form-label">المبلغ قبل الضريبة</label>
      <input class="form-control" type="number" step="0.01" min="0" name="subtotal" value="{subtotal}" required>
    </div>
    <div class="col-md-2">
      <label class="form-label">الضريبة %</label>
      <input class="form-control" type="number" step="0.01" min="0" max="100" name="tax_rate" value="{tax}">
    </div>
    <div class="col-md-2">
      <label class="form-label">الخصم</label>
      <input class="form-control" type="number" step="0.01" min="0" name="discount" value="{discount}">
    </div>
    <div class="col-md-4">
      <label class="form-label">الحالة</label>
      <select class="form-select" name="status">{statuses}</select>
    </div>
    <div class="col-md-8">
      <label class="form-label">ملاحظات</label>
      <textarea class="form-control" name="notes" rows="2">{notes}</textarea>
    </div>
  </div>
  <div class="mt-3">
    <button type="submit" class="btn btn-primary">حفظ الفاتورة</button>
    <a href="{back}" class="btn btn-outline-secondary">إلغاء</a>
  </div>
</form>
</div></div>"#,
        new_title = kind.new_title(),
        error = error.map(|e| alert(AlertKind::Danger, e)).unwrap_or_default(),
        action = kind.add_path(),
        party_label = kind.party_label(),
        field = kind.party_field(),
        party_name = value(|v| v.party_name.as_deref()),
        date = value(|v| v.date.as_deref()),
        subtotal = value(|v| Some(v.subtotal.as_str())),
        tax = tax_value,
        discount = value(|v| v.discount.as_deref()),
        notes = value(|v| v.notes.as_deref()),
        back = kind.list_path(),
    );
    layout(kind.new_title(), Some(user), &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn user() -> SessionUser {
        SessionUser {
            user_id: 1,
            username: "admin".into(),
            full_name: "مدير النظام".into(),
        }
    }

    #[test]
    fn sales_form_names_the_customer_fields() {
        let html = invoice_form(
            &user(),
            InvoiceKind::Sales,
            &[(7, "شركة <النور>".into())],
            dec!(15),
            None,
            None,
        );
        assert!(html.contains("<form"));
        assert!(html.contains(r#"name="customer_id""#));
        assert!(html.contains("عميل"));
        assert!(html.contains("مبلغ"));
        assert!(html.contains("شركة &lt;النور&gt;"));
        assert!(html.contains(r#"name="tax_rate" value="15""#));
        assert!(!html.contains("alert-danger"));
    }

    #[test]
    fn purchase_form_keeps_submitted_values_on_error() {
        let values = InvoiceForm {
            party_id: Some("2".into()),
            subtotal: "-5".into(),
            ..Default::default()
        };
        let html = invoice_form(
            &user(),
            InvoiceKind::Purchase,
            &[(2, "مورد".into())],
            dec!(15),
            Some("المبلغ قبل الضريبة يجب ألا يكون سالباً"),
            Some(&values),
        );
        assert!(html.contains("alert-danger"));
        assert!(html.contains(r#"<option value="2" selected>"#));
        assert!(html.contains(r#"name="subtotal" value="-5""#));
        assert!(html.contains(r#"name="supplier_id""#));
    }

    #[test]
    fn empty_list_shows_message() {
        let html = invoice_list(&user(), InvoiceKind::Sales, &[], None);
        assert!(html.contains("فواتير المبيعات"));
        assert!(html.contains("لا توجد فواتير المبيعات"));
    }
}
