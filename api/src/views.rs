//! Server-rendered HTML pages. Every value that originates from user input or
//! the database goes through [`escape`].

use crate::types::{Backend, ProjectRow, SprintRow, UserRow};
use axum::http::StatusCode;
use std::fmt::Write;

/// Escapes the five HTML-significant characters.
pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{}</title>\n\
         <link rel=\"stylesheet\" href=\"/static/style.css\">\n\
         </head>\n\
         <body>\n\
         <nav><a href=\"/\">PostgreSQL</a> | <a href=\"/mongo\">MongoDB</a></nav>\n\
         {body}\
         </body>\n\
         </html>\n",
        escape(title)
    )
}

fn input(name: &str, label: &str, value: &str) -> String {
    format!(
        "<label>{label} <input name=\"{name}\" value=\"{}\" required></label>\n",
        escape(value)
    )
}

fn form(action: &str, submit: &str, fields: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{action}\">\n{fields}<button type=\"submit\">{submit}</button>\n</form>\n"
    )
}

fn hidden_id(id: &str) -> String {
    format!("<input type=\"hidden\" name=\"id\" value=\"{}\">\n", escape(id))
}

fn user_fields(user: &UserRow) -> String {
    input("username", "Username", &user.username)
        + &input("first_name", "First name", &user.first_name)
        + &input("last_name", "Last name", &user.last_name)
}

fn project_fields(project: &ProjectRow) -> String {
    let duration = if project.id.is_empty() {
        String::new()
    } else {
        project.sprint_duration.to_string()
    };
    input("name", "Name", &project.name)
        + &input("identifier", "Identifier", &project.identifier)
        + &input("invite_code", "Invite code", &project.invite_code)
        + &input("sprint_duration", "Sprint duration", &duration)
        + &input("owner_id", "Owner id", &project.owner_id)
}

fn sprint_fields(sprint: &SprintRow) -> String {
    let (start, end) = if sprint.id.is_empty() {
        (String::new(), String::new())
    } else {
        (sprint.start_date.to_string(), sprint.end_date.to_string())
    };
    input("name", "Name", &sprint.name)
        + &input("start_date", "Start date", &start)
        + &input("end_date", "End date", &end)
        + &input("project_id", "Project id", &sprint.project_id)
}

fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut html = String::from("<table>\n<tr>");
    for header in headers {
        let _ = write!(html, "<th>{header}</th>");
    }
    html.push_str("</tr>\n");
    for row in rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{cell}</td>");
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n");
    html
}

fn detail_link(backend: Backend, kind: &str, id: &str) -> String {
    let id = escape(id);
    format!("<a href=\"/{backend}/{kind}/{id}\">{id}</a>")
}

/// Index page for one backend: every user, project and sprint plus the
/// create forms. `search` narrows the project list by name.
pub fn index_page(
    backend: Backend,
    users: &[UserRow],
    projects: &[ProjectRow],
    sprints: &[SprintRow],
    search: Option<&str>,
) -> String {
    let mut body = format!("<h1>{} CRUD</h1>\n", backend.title());

    body.push_str("<h2>Users</h2>\n");
    body.push_str(&table(
        &["Id", "Username", "First name", "Last name"],
        users
            .iter()
            .map(|u| {
                vec![
                    detail_link(backend, "users", &u.id),
                    escape(&u.username),
                    escape(&u.first_name),
                    escape(&u.last_name),
                ]
            })
            .collect(),
    ));
    body.push_str(&form(
        &format!("/{backend}/users"),
        "Add user",
        &user_fields(&UserRow::default()),
    ));

    body.push_str("<h2>Projects</h2>\n");
    let _ = write!(
        body,
        "<form method=\"get\" action=\"{}\">\n\
         <input name=\"search\" placeholder=\"Search by name\" value=\"{}\">\n\
         <button type=\"submit\">Search</button>\n\
         </form>\n",
        backend.index_path(),
        escape(search.unwrap_or_default())
    );
    body.push_str(&table(
        &["Id", "Name", "Identifier", "Invite code", "Sprint duration", "Owner"],
        projects
            .iter()
            .map(|p| {
                vec![
                    detail_link(backend, "projects", &p.id),
                    escape(&p.name),
                    escape(&p.identifier),
                    escape(&p.invite_code),
                    p.sprint_duration.to_string(),
                    detail_link(backend, "users", &p.owner_id),
                ]
            })
            .collect(),
    ));
    body.push_str(&form(
        &format!("/{backend}/projects"),
        "Add project",
        &project_fields(&ProjectRow::default()),
    ));

    body.push_str("<h2>Sprints</h2>\n");
    body.push_str(&table(
        &["Id", "Name", "Start date", "End date", "Project"],
        sprints
            .iter()
            .map(|s| {
                vec![
                    detail_link(backend, "sprints", &s.id),
                    escape(&s.name),
                    s.start_date.to_string(),
                    s.end_date.to_string(),
                    detail_link(backend, "projects", &s.project_id),
                ]
            })
            .collect(),
    ));
    body.push_str(&form(
        &format!("/{backend}/sprints"),
        "Add sprint",
        &sprint_fields(&SprintRow::default()),
    ));

    layout(&format!("{} CRUD", backend.title()), &body)
}

fn detail_page(backend: Backend, kind: &str, title: &str, id: &str, fields: &str) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape(title));
    body.push_str(&form(
        &format!("/{backend}/{kind}/update"),
        "Update",
        &(hidden_id(id) + fields),
    ));
    body.push_str(&form(
        &format!("/{backend}/{kind}/delete"),
        "Delete",
        &hidden_id(id),
    ));
    let _ = writeln!(body, "<p><a href=\"{}\">Back</a></p>", backend.index_path());
    layout(title, &body)
}

pub fn user_page(backend: Backend, user: &UserRow) -> String {
    detail_page(
        backend,
        "users",
        &format!("User {}", user.username),
        &user.id,
        &user_fields(user),
    )
}

pub fn project_page(backend: Backend, project: &ProjectRow) -> String {
    detail_page(
        backend,
        "projects",
        &format!("Project {}", project.name),
        &project.id,
        &project_fields(project),
    )
}

pub fn sprint_page(backend: Backend, sprint: &SprintRow) -> String {
    detail_page(
        backend,
        "sprints",
        &format!("Sprint {}", sprint.name),
        &sprint.id,
        &sprint_fields(sprint),
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<p><a href=\"/\">Back</a></p>\n",
        escape(&status.to_string()),
        escape(message)
    );
    layout(&status.to_string(), &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserRow {
        UserRow {
            id: "3".to_string(),
            username: "<script>alert(1)</script>".to_string(),
            first_name: "Ada".to_string(),
            last_name: "O'Neil".to_string(),
        }
    }

    #[test]
    fn escape_covers_markup_characters() {
        assert_eq!(
            escape(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn index_lists_rows_and_create_forms() {
        let project = ProjectRow {
            id: "5".to_string(),
            name: "Apollo".to_string(),
            sprint_duration: 14,
            owner_id: "3".to_string(),
            ..Default::default()
        };
        let page = index_page(Backend::Postgres, &[user()], &[project], &[], Some("Apo"));

        assert!(page.contains("<h1>PostgreSQL CRUD</h1>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("href=\"/postgres/projects/5\""));
        assert!(page.contains("action=\"/postgres/users\""));
        assert!(page.contains("action=\"/postgres/projects\""));
        assert!(page.contains("action=\"/postgres/sprints\""));
        assert!(page.contains("value=\"Apo\""));
    }

    #[test]
    fn mongo_index_posts_to_mongo_routes() {
        let page = index_page(Backend::Mongo, &[], &[], &[], None);
        assert!(page.contains("action=\"/mongo/users\""));
        assert!(page.contains("action=\"/mongo\""));
    }

    #[test]
    fn detail_page_prefills_update_form() {
        let page = user_page(Backend::Mongo, &user());
        assert!(page.contains("action=\"/mongo/users/update\""));
        assert!(page.contains("action=\"/mongo/users/delete\""));
        assert!(page.contains("name=\"id\" value=\"3\""));
        assert!(page.contains("value=\"O&#39;Neil\""));
    }

    #[test]
    fn sprint_page_shows_timestamps() {
        let sprint = SprintRow {
            id: "9".to_string(),
            name: "Sprint 1".to_string(),
            start_date: 1_700_000_000,
            end_date: 1_700_086_400,
            project_id: "5".to_string(),
        };
        let page = sprint_page(Backend::Postgres, &sprint);
        assert!(page.contains("value=\"1700000000\""));
        assert!(page.contains("value=\"1700086400\""));
    }

    #[test]
    fn error_page_shows_status() {
        let page = error_page(StatusCode::CONFLICT, "still referenced");
        assert!(page.contains("409 Conflict"));
        assert!(page.contains("still referenced"));
    }
}
