//! Plain server-rendered HTML. Every interpolated value goes through
//! [`escape`].

use crate::domain::model::{Customer, Project};
use std::fmt::Write;

pub const NO_PROJECTS: &str = "No projects found.";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        escape(title),
        body
    )
}

fn error_banner(message: &str) -> String {
    format!("<p class=\"error\" role=\"alert\">{}</p>\n", escape(message))
}

fn logout_form() -> &'static str {
    "<form method=\"post\" action=\"/logout\"><button type=\"submit\">Logout</button></form>\n"
}

fn status_class(status: &str) -> &'static str {
    match status {
        "Open" => "status-open",
        "Completed" => "status-completed",
        "Cancelled" => "status-cancelled",
        _ => "status-other",
    }
}

fn date_range(project: &Project) -> Option<String> {
    match (project.expected_start_date, project.expected_end_date) {
        (None, None) => None,
        (start, end) => Some(format!(
            "{} to {}",
            start.map(|d| d.to_string()).unwrap_or_else(|| "?".into()),
            end.map(|d| d.to_string()).unwrap_or_else(|| "?".into()),
        )),
    }
}

fn progress_bar(progress: f64) -> String {
    format!(
        "<progress max=\"100\" value=\"{p}\">{p}%</progress> {p}%",
        p = progress
    )
}

pub fn login_page(usr: &str, redirect: Option<&str>, error: Option<&str>) -> String {
    let mut body = String::from("<h1>Customer Portal</h1>\n");
    if let Some(error) = error {
        body.push_str(&error_banner(error));
    }
    body.push_str("<form method=\"post\" action=\"/login\">\n");
    let _ = writeln!(
        body,
        "<label>Username <input type=\"text\" name=\"usr\" value=\"{}\" autocomplete=\"username\"></label>",
        escape(usr)
    );
    body.push_str(
        "<label>Password <input type=\"password\" name=\"pwd\" autocomplete=\"current-password\"></label>\n",
    );
    if let Some(redirect) = redirect {
        let _ = writeln!(
            body,
            "<input type=\"hidden\" name=\"redirect\" value=\"{}\">",
            escape(redirect)
        );
    }
    body.push_str("<button type=\"submit\">Sign in</button>\n</form>\n");
    layout("Sign in", &body)
}

fn project_row(project: &Project) -> String {
    let mut row = String::from("<li>");
    let _ = write!(
        row,
        "<a href=\"/dashboard/projects/{}\">{}</a>",
        escape(&urlencoding::encode(&project.name)),
        escape(&project.project_name)
    );
    if let Some(code) = &project.project_code {
        let _ = write!(row, " <code>{}</code>", escape(code));
    }
    if let Some(status) = &project.status {
        let _ = write!(
            row,
            " <span class=\"{}\">{}</span>",
            status_class(status),
            escape(status)
        );
    }
    if let Some(progress) = project.progress() {
        let _ = write!(row, " {}", progress_bar(progress));
    }
    row.push_str("</li>\n");
    row
}

pub fn dashboard_page(
    user: &str,
    customer: Option<&Customer>,
    projects: &[Project],
    error: Option<&str>,
) -> String {
    let mut body = String::from("<h1>Dashboard</h1>\n");
    let _ = writeln!(body, "<p>Signed in as {}</p>", escape(user));
    if let Some(customer) = customer {
        let _ = writeln!(body, "<p>Customer: {}</p>", escape(&customer.customer_name));
    }
    body.push_str(logout_form());
    if let Some(error) = error {
        body.push_str(&error_banner(error));
    }

    body.push_str("<h2>Projects</h2>\n");
    if projects.is_empty() {
        if error.is_none() {
            let _ = writeln!(body, "<p>{}</p>", NO_PROJECTS);
        }
    } else {
        body.push_str("<ul>\n");
        for project in projects {
            body.push_str(&project_row(project));
        }
        body.push_str("</ul>\n");
    }
    layout("Dashboard", &body)
}

pub fn project_page(user: &str, project: Option<&Project>, error: Option<&str>) -> String {
    let mut body = String::from("<p><a href=\"/dashboard\">Back to dashboard</a></p>\n");
    let _ = writeln!(body, "<p>Signed in as {}</p>", escape(user));
    if let Some(error) = error {
        body.push_str(&error_banner(error));
    }

    let title = match project {
        Some(project) => {
            let _ = writeln!(body, "<h1>{}</h1>\n<dl>", escape(&project.project_name));
            let _ = writeln!(body, "<dt>ID</dt><dd>{}</dd>", escape(&project.name));
            if let Some(code) = &project.project_code {
                let _ = writeln!(body, "<dt>Code</dt><dd>{}</dd>", escape(code));
            }
            if let Some(status) = &project.status {
                let _ = writeln!(
                    body,
                    "<dt>Status</dt><dd><span class=\"{}\">{}</span></dd>",
                    status_class(status),
                    escape(status)
                );
            }
            if let Some(range) = date_range(project) {
                let _ = writeln!(body, "<dt>Schedule</dt><dd>{}</dd>", escape(&range));
            }
            if let Some(progress) = project.progress() {
                let _ = writeln!(body, "<dt>Progress</dt><dd>{}</dd>", progress_bar(progress));
            }
            body.push_str("</dl>\n");
            project.project_name.as_str()
        }
        None => "Project",
    };
    layout(title, &body)
}

pub fn error_page(title: &str, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n{}<p><a href=\"/dashboard\">Back to dashboard</a></p>\n",
        escape(title),
        error_banner(message)
    );
    layout(title, &body)
}
