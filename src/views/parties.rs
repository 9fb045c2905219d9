use super::{alert, escape_html, escape_opt, format_date, layout, AlertKind, Notice};
use crate::{
    auth::SessionUser,
    entities::{customer, supplier},
    services::{customers::NewCustomer, suppliers::NewSupplier},
};

pub fn customers(
    user: &SessionUser,
    rows: &[customer::Model],
    notice: Option<Notice>,
    error: Option<&str>,
    form: Option<&NewCustomer>,
) -> String {
    let table = if rows.is_empty() {
        r#"<p class="text-muted text-center">لا يوجد عملاء</p>"#.to_string()
    } else {
        let body: String = rows
            .iter()
            .map(|c| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    c.id,
                    escape_html(&c.name),
                    escape_opt(c.email.as_deref()),
                    escape_opt(c.phone.as_deref()),
                    format_date(&c.created_at),
                )
            })
            .collect();
        format!(
            r#"<table class="table table-striped" id="customersTable">
  <thead><tr><th>#</th><th>الاسم</th><th>البريد الإلكتروني</th><th>الهاتف</th><th>تاريخ الإضافة</th></tr></thead>
  <tbody>{body}</tbody>
</table>"#
        )
    };

    let body = format!(
        r#"<h2>إدارة العملاء</h2>
{notice}{error}
<div class="card mb-4"><div class="card-body">
  <h5>إضافة عميل</h5>
  <form method="POST" action="/add_customer" class="row g-2">
    <div class="col-md-4"><input class="form-control" name="name" placeholder="اسم العميل" value="{name}" required></div>
    <div class="col-md-4"><input class="form-control" type="email" name="email" placeholder="البريد الإلكتروني" value="{email}"></div>
    <div class="col-md-3"><input class="form-control" name="phone" placeholder="الهاتف" value="{phone}"></div>
    <div class="col-md-1"><button class="btn btn-primary w-100" type="submit">حفظ</button></div>
  </form>
</div></div>
<div class="card"><div class="card-body">{table}</div></div>"#,
        notice = notice.map(|n| n.render()).unwrap_or_default(),
        error = error.map(|e| alert(AlertKind::Danger, e)).unwrap_or_default(),
        name = form.map(|f| escape_html(&f.name)).unwrap_or_default(),
        email = form.map(|f| escape_opt(f.email.as_deref())).unwrap_or_default(),
        phone = form.map(|f| escape_opt(f.phone.as_deref())).unwrap_or_default(),
    );
    layout("العملاء", Some(user), &body)
}

pub fn suppliers(
    user: &SessionUser,
    rows: &[supplier::Model],
    notice: Option<Notice>,
    error: Option<&str>,
    form: Option<&NewSupplier>,
) -> String {
    let table = if rows.is_empty() {
        r#"<p class="text-muted text-center">لا يوجد موردين</p>"#.to_string()
    } else {
        let body: String = rows
            .iter()
            .map(|s| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    s.id,
                    escape_html(&s.name),
                    escape_opt(s.contact_info.as_deref()),
                    format_date(&s.created_at),
                )
            })
            .collect();
        format!(
            r#"<table class="table table-striped" id="suppliersTable">
  <thead><tr><th>#</th><th>الاسم</th><th>بيانات الاتصال</th><th>تاريخ الإضافة</th></tr></thead>
  <tbody>{body}</tbody>
</table>"#
        )
    };

    let body = format!(
        r#"<h2>إدارة الموردين</h2>
{notice}{error}
<div class="card mb-4"><div class="card-body">
  <h5>إضافة مورد</h5>
  <form method="POST" action="/add_supplier" class="row g-2">
    <div class="col-md-5"><input class="form-control" name="name" placeholder="اسم المورد" value="{name}" required></div>
    <div class="col-md-6"><input class="form-control" name="contact_info" placeholder="بيانات الاتصال" value="{contact}"></div>
    <div class="col-md-1"><button class="btn btn-primary w-100" type="submit">حفظ</button></div>
  </form>
</div></div>
<div class="card"><div class="card-body">{table}</div></div>"#,
        notice = notice.map(|n| n.render()).unwrap_or_default(),
        error = error.map(|e| alert(AlertKind::Danger, e)).unwrap_or_default(),
        name = form.map(|f| escape_html(&f.name)).unwrap_or_default(),
        contact = form
            .map(|f| escape_opt(f.contact_info.as_deref()))
            .unwrap_or_default(),
    );
    layout("الموردين", Some(user), &body)
}
