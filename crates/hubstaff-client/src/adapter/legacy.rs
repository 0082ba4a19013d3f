//! Legacy mapping: organization ID per invocation, `date[...]` filters,
//! every organization-owned entity nested under `/organizations/{org}`.

use crate::error::Result;
use crate::format::format_date;
use crate::request::{ApiRequest, Body, Query};
use crate::resource::{Invocation, Operation, Params, Resource};

use super::{
    AdapterContext, EndpointAdapter, Plan, delete_ack, optional_range, page, required_range,
    scope_filters, set_date, set_ids, set_text, status_filter, unsupported,
};

pub struct LegacyAdapter;

impl EndpointAdapter for LegacyAdapter {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn plan(&self, invocation: &Invocation, _ctx: &AdapterContext<'_>) -> Result<Plan> {
        let params = &invocation.params;
        let op = invocation.operation;

        match invocation.resource {
            Resource::Organization => match op {
                Operation::Get => {
                    let org = params.id("organizationId")?;
                    Ok(Plan::call(ApiRequest::get(format!("/organizations/{org}"))))
                }
                Operation::GetAll => Ok(Plan::call(ApiRequest::get("/organizations"))),
                _ => Err(unsupported(invocation)),
            },

            Resource::Project => {
                let org = params.id("organizationId")?;
                let base = format!("/organizations/{org}/projects");
                match op {
                    Operation::Get => {
                        let id = params.id("projectId")?;
                        Ok(Plan::call(ApiRequest::get(format!("{base}/{id}"))))
                    }
                    Operation::GetAll => {
                        let fields = params.section("additionalFields");
                        let mut query = Query::new();
                        if let Some(status) = fields.text("status") {
                            query.insert("status", status);
                        }
                        page(&mut query, &fields);
                        Ok(Plan::call(ApiRequest::get(base).with_query(query)))
                    }
                    Operation::Create => {
                        let fields = params.section("additionalFields");
                        let mut body = Body::new();
                        set_text(&mut body, "name", Some(params.required("name")?));
                        set_text(&mut body, "description", fields.text("description"));
                        if let Some(billable) = fields.flag("billable") {
                            body.insert("billable".into(), billable.into());
                        }
                        Ok(Plan::call(ApiRequest::post(base, body)))
                    }
                    Operation::Update => {
                        let id = params.id("projectId")?;
                        let fields = params.section("updateFields");
                        let mut body = Body::new();
                        set_text(&mut body, "name", fields.text("name"));
                        set_text(&mut body, "description", fields.present_text("description"));
                        set_text(&mut body, "status", fields.text("status"));
                        Ok(Plan::call(ApiRequest::put(format!("{base}/{id}"), body)))
                    }
                    Operation::Delete => {
                        let id = params.id("projectId")?;
                        Ok(Plan::acknowledged(
                            ApiRequest::delete(format!("{base}/{id}")),
                            delete_ack("projectId", &id, &org),
                        ))
                    }
                    _ => Err(unsupported(invocation)),
                }
            }

            Resource::Activity => match op {
                Operation::GetAll => {
                    let org = params.id("organizationId")?;
                    let fields = params.section("additionalFields");
                    let endpoint = if fields.flag("useDaily").unwrap_or(false) {
                        format!("/organizations/{org}/activities/daily")
                    } else {
                        format!("/organizations/{org}/activities")
                    };
                    date_report(endpoint, params)
                }
                _ => Err(unsupported(invocation)),
            },

            Resource::TimeEntry => report(invocation, "time_entries"),
            Resource::Screenshot => report(invocation, "screenshots"),
            Resource::Application => report(invocation, "activities/applications"),
            Resource::Url => report(invocation, "activities/urls"),

            Resource::Member => match op {
                Operation::GetAll => members(params),
                Operation::Get => {
                    let org = params.id("organizationId")?;
                    let id = params.id("memberId")?;
                    Ok(Plan::call(ApiRequest::get(format!(
                        "/organizations/{org}/members/{id}"
                    ))))
                }
                _ => Err(unsupported(invocation)),
            },

            Resource::User => match op {
                Operation::GetCurrent => Ok(Plan::call(ApiRequest::get("/users/me"))),
                Operation::Get => {
                    let id = params.id("userId")?;
                    Ok(Plan::call(ApiRequest::get(format!("/users/{id}"))))
                }
                Operation::GetAll => members(params),
                _ => Err(unsupported(invocation)),
            },

            Resource::Task => {
                let org = params.id("organizationId")?;
                match op {
                    Operation::Get => {
                        let id = params.id("taskId")?;
                        Ok(Plan::call(ApiRequest::get(format!(
                            "/organizations/{org}/tasks/{id}"
                        ))))
                    }
                    Operation::GetAll => {
                        let project = params.id("projectId")?;
                        let filters = params.section("filters");
                        let mut query = Query::new();
                        status_filter(&mut query, &filters);
                        if let Some(assignee) = filters.text("assigneeId") {
                            query.insert("assignee_id", assignee);
                        }
                        page(&mut query, &filters);
                        Ok(Plan::call(
                            ApiRequest::get(format!(
                                "/organizations/{org}/projects/{project}/tasks"
                            ))
                            .with_query(query),
                        ))
                    }
                    Operation::Create => {
                        let project = params.id("projectId")?;
                        let fields = params.section("additionalFields");
                        let mut body = Body::new();
                        set_text(&mut body, "summary", Some(params.required("summary")?));
                        set_text(&mut body, "description", fields.text("description"));
                        set_text(&mut body, "assignee_id", fields.text("assigneeId"));
                        set_date(&mut body, "due_at", fields.text("dueAt"))?;
                        Ok(Plan::call(ApiRequest::post(
                            format!("/organizations/{org}/projects/{project}/tasks"),
                            body,
                        )))
                    }
                    Operation::Update => {
                        let id = params.id("taskId")?;
                        let fields = params.section("updateFields");
                        let mut body = Body::new();
                        set_text(&mut body, "summary", fields.text("summary"));
                        set_text(&mut body, "description", fields.present_text("description"));
                        set_text(&mut body, "assignee_id", fields.text("assigneeId"));
                        set_text(&mut body, "status", fields.text("status"));
                        set_date(&mut body, "due_at", fields.text("dueAt"))?;
                        Ok(Plan::call(ApiRequest::put(
                            format!("/organizations/{org}/tasks/{id}"),
                            body,
                        )))
                    }
                    Operation::Delete => {
                        let id = params.id("taskId")?;
                        Ok(Plan::acknowledged(
                            ApiRequest::delete(format!("/organizations/{org}/tasks/{id}")),
                            delete_ack("taskId", &id, &org),
                        ))
                    }
                    _ => Err(unsupported(invocation)),
                }
            }

            Resource::Note => {
                let org = params.id("organizationId")?;
                let base = format!("/organizations/{org}/notes");
                match op {
                    Operation::Get => {
                        let id = params.id("noteId")?;
                        Ok(Plan::call(ApiRequest::get(format!("{base}/{id}"))))
                    }
                    Operation::GetAll => {
                        let filters = params.section("filters");
                        let mut query = Query::new();
                        optional_range(
                            &mut query,
                            "date",
                            filters.text("startDate"),
                            filters.text("endDate"),
                            format_date,
                        )?;
                        scope_filters(&mut query, &filters);
                        Ok(Plan::call(ApiRequest::get(base).with_query(query)))
                    }
                    Operation::Create => {
                        let fields = params.section("additionalFields");
                        let mut body = Body::new();
                        set_text(&mut body, "description", Some(params.required("description")?));
                        set_text(&mut body, "user_id", fields.text("userId"));
                        set_text(&mut body, "project_id", fields.text("projectId"));
                        set_text(&mut body, "task_id", fields.text("taskId"));
                        Ok(Plan::call(ApiRequest::post(base, body)))
                    }
                    _ => Err(unsupported(invocation)),
                }
            }

            Resource::Client => {
                let org = params.id("organizationId")?;
                let base = format!("/organizations/{org}/clients");
                match op {
                    Operation::Get => {
                        let id = params.id("clientId")?;
                        Ok(Plan::call(ApiRequest::get(format!("{base}/{id}"))))
                    }
                    Operation::GetAll => {
                        let filters = params.section("filters");
                        let mut query = Query::new();
                        status_filter(&mut query, &filters);
                        page(&mut query, &filters);
                        Ok(Plan::call(ApiRequest::get(base).with_query(query)))
                    }
                    Operation::Create => {
                        let fields = params.section("additionalFields");
                        let mut body = Body::new();
                        set_text(&mut body, "name", Some(params.required("name")?));
                        client_contact(&mut body, &fields);
                        set_text(&mut body, "description", fields.text("description"));
                        Ok(Plan::call(ApiRequest::post(base, body)))
                    }
                    Operation::Update => {
                        let id = params.id("clientId")?;
                        let fields = params.section("updateFields");
                        let mut body = Body::new();
                        set_text(&mut body, "name", fields.text("name"));
                        client_contact(&mut body, &fields);
                        set_text(&mut body, "description", fields.present_text("description"));
                        set_text(&mut body, "status", fields.text("status"));
                        Ok(Plan::call(ApiRequest::put(format!("{base}/{id}"), body)))
                    }
                    Operation::Delete => {
                        let id = params.id("clientId")?;
                        Ok(Plan::acknowledged(
                            ApiRequest::delete(format!("{base}/{id}")),
                            delete_ack("clientId", &id, &org),
                        ))
                    }
                    _ => Err(unsupported(invocation)),
                }
            }

            Resource::Invoice => {
                let org = params.id("organizationId")?;
                let base = format!("/organizations/{org}/invoices");
                match op {
                    Operation::Get => {
                        let id = params.id("invoiceId")?;
                        Ok(Plan::call(ApiRequest::get(format!("{base}/{id}"))))
                    }
                    Operation::GetAll => {
                        let filters = params.section("filters");
                        let mut query = Query::new();
                        if let Some(client) = filters.text("clientId") {
                            query.insert("client_id", client);
                        }
                        status_filter(&mut query, &filters);
                        optional_range(
                            &mut query,
                            "date",
                            filters.text("startDate"),
                            filters.text("endDate"),
                            format_date,
                        )?;
                        page(&mut query, &filters);
                        Ok(Plan::call(ApiRequest::get(base).with_query(query)))
                    }
                    Operation::Create => {
                        let fields = params.section("additionalFields");
                        let mut body = Body::new();
                        set_text(&mut body, "client_id", Some(params.id("clientId")?));
                        set_text(&mut body, "invoice_number", fields.text("invoiceNumber"));
                        set_date(&mut body, "issue_date", fields.text("issueDate"))?;
                        set_date(&mut body, "due_date", fields.text("dueDate"))?;
                        set_text(&mut body, "notes", fields.text("notes"));
                        set_ids(&mut body, "project_ids", fields.list("projectIds"));
                        set_date(&mut body, "start_date", fields.text("startDate"))?;
                        set_date(&mut body, "end_date", fields.text("endDate"))?;
                        Ok(Plan::call(ApiRequest::post(base, body)))
                    }
                    Operation::Update => {
                        let id = params.id("invoiceId")?;
                        let fields = params.section("updateFields");
                        let mut body = Body::new();
                        set_text(&mut body, "invoice_number", fields.text("invoiceNumber"));
                        set_date(&mut body, "issue_date", fields.text("issueDate"))?;
                        set_date(&mut body, "due_date", fields.text("dueDate"))?;
                        set_text(&mut body, "notes", fields.present_text("notes"));
                        set_text(&mut body, "status", fields.text("status"));
                        Ok(Plan::call(ApiRequest::put(format!("{base}/{id}"), body)))
                    }
                    Operation::Delete => {
                        let id = params.id("invoiceId")?;
                        Ok(Plan::acknowledged(
                            ApiRequest::delete(format!("{base}/{id}")),
                            delete_ack("invoiceId", &id, &org),
                        ))
                    }
                    _ => Err(unsupported(invocation)),
                }
            }

            Resource::Schedule => {
                let org = params.id("organizationId")?;
                let base = format!("/organizations/{org}/schedules");
                match op {
                    Operation::Get => {
                        let id = params.id("scheduleId")?;
                        Ok(Plan::call(ApiRequest::get(format!("{base}/{id}"))))
                    }
                    Operation::GetAll => {
                        let filters = params.section("filters");
                        let mut query = Query::new();
                        if let Some(users) = filters.list("userId") {
                            query.insert("user_ids", users);
                        }
                        optional_range(
                            &mut query,
                            "date",
                            filters.text("startDate"),
                            filters.text("endDate"),
                            format_date,
                        )?;
                        page(&mut query, &filters);
                        Ok(Plan::call(ApiRequest::get(base).with_query(query)))
                    }
                    Operation::Create => {
                        let fields = params.section("additionalFields");
                        let mut body = Body::new();
                        set_text(&mut body, "user_id", Some(params.id("userId")?));
                        set_text(&mut body, "start_time", Some(params.required("startTime")?));
                        set_text(&mut body, "end_time", Some(params.required("endTime")?));
                        set_text(&mut body, "project_id", fields.text("projectId"));
                        set_text(&mut body, "task_id", fields.text("taskId"));
                        set_text(&mut body, "notes", fields.text("notes"));
                        set_text(&mut body, "repeat", fields.text("repeat"));
                        Ok(Plan::call(ApiRequest::post(base, body)))
                    }
                    Operation::Update => {
                        let id = params.id("scheduleId")?;
                        let fields = params.section("updateFields");
                        let mut body = Body::new();
                        set_text(&mut body, "start_time", fields.text("startTime"));
                        set_text(&mut body, "end_time", fields.text("endTime"));
                        set_text(&mut body, "project_id", fields.text("projectId"));
                        set_text(&mut body, "task_id", fields.text("taskId"));
                        set_text(&mut body, "notes", fields.present_text("notes"));
                        Ok(Plan::call(ApiRequest::put(format!("{base}/{id}"), body)))
                    }
                    Operation::Delete => {
                        let id = params.id("scheduleId")?;
                        Ok(Plan::acknowledged(
                            ApiRequest::delete(format!("{base}/{id}")),
                            delete_ack("scheduleId", &id, &org),
                        ))
                    }
                    _ => Err(unsupported(invocation)),
                }
            }

            Resource::Todo => {
                let org = params.id("organizationId")?;
                let base = format!("/organizations/{org}/todos");
                match op {
                    Operation::Get => {
                        let id = params.id("todoId")?;
                        Ok(Plan::call(ApiRequest::get(format!("{base}/{id}"))))
                    }
                    Operation::GetAll => {
                        let filters = params.section("filters");
                        let mut query = Query::new();
                        if let Some(users) = filters.list("userId") {
                            query.insert("user_ids", users);
                        }
                        if let Some(projects) = filters.list("projectId") {
                            query.insert("project_ids", projects);
                        }
                        status_filter(&mut query, &filters);
                        page(&mut query, &filters);
                        Ok(Plan::call(ApiRequest::get(base).with_query(query)))
                    }
                    Operation::Create => {
                        let fields = params.section("additionalFields");
                        let mut body = Body::new();
                        set_text(&mut body, "title", Some(params.required("title")?));
                        set_text(&mut body, "description", fields.text("description"));
                        set_text(&mut body, "user_id", fields.text("userId"));
                        set_text(&mut body, "project_id", fields.text("projectId"));
                        set_date(&mut body, "due_at", fields.text("dueAt"))?;
                        set_text(&mut body, "priority", fields.text("priority"));
                        Ok(Plan::call(ApiRequest::post(base, body)))
                    }
                    Operation::Update => {
                        let id = params.id("todoId")?;
                        let fields = params.section("updateFields");
                        let mut body = Body::new();
                        set_text(&mut body, "title", fields.text("title"));
                        set_text(&mut body, "description", fields.present_text("description"));
                        set_text(&mut body, "user_id", fields.text("userId"));
                        set_text(&mut body, "status", fields.text("status"));
                        set_date(&mut body, "due_at", fields.text("dueAt"))?;
                        set_text(&mut body, "priority", fields.text("priority"));
                        Ok(Plan::call(ApiRequest::put(format!("{base}/{id}"), body)))
                    }
                    Operation::Delete => {
                        let id = params.id("todoId")?;
                        Ok(Plan::acknowledged(
                            ApiRequest::delete(format!("{base}/{id}")),
                            delete_ack("todoId", &id, &org),
                        ))
                    }
                    _ => Err(unsupported(invocation)),
                }
            }
        }
    }
}

/// Date-bounded report under `/organizations/{org}/{path}` (getAll only).
fn report(invocation: &Invocation, path: &str) -> Result<Plan> {
    if invocation.operation != Operation::GetAll {
        return Err(unsupported(invocation));
    }
    let org = invocation.params.id("organizationId")?;
    date_report(format!("/organizations/{org}/{path}"), &invocation.params)
}

fn date_report(endpoint: String, params: &Params) -> Result<Plan> {
    let mut query = Query::new();
    required_range(&mut query, "date", params, format_date)?;
    scope_filters(&mut query, &params.section("additionalFields"));
    Ok(Plan::call(ApiRequest::get(endpoint).with_query(query)))
}

fn members(params: &Params) -> Result<Plan> {
    let org = params.id("organizationId")?;
    let fields = params.section("additionalFields");
    let mut query = Query::new();
    if let Some(include) = fields.flag("includeRemoved") {
        query.insert("include_removed", include);
    }
    page(&mut query, &fields);
    Ok(Plan::call(
        ApiRequest::get(format!("/organizations/{org}/members")).with_query(query),
    ))
}

fn client_contact(body: &mut Body, fields: &Params) {
    set_text(body, "email", fields.text("email"));
    set_text(body, "phone", fields.text("phone"));
    set_text(body, "address", fields.text("address"));
}
