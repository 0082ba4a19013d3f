//! Organization-scoped mapping.
//!
//! The organization comes from the credential. Collections stay under
//! `/organizations/{org}`; single entities are addressed at top-level paths.
//! Activity-style reports filter on `time_slot[...]` timestamps, calendar
//! reports on `date[...]` days and invoices on `issue_date[...]`.

use serde_json::Value;

use crate::error::{Error, Result};
use crate::format::{format_date, format_time_slot};
use crate::request::{ApiRequest, Body, Query};
use crate::resource::{Invocation, Operation, Params, Resource, path_segment};

use super::{
    AdapterContext, EndpointAdapter, Plan, delete_ack, list_filter, optional_range, page,
    required_range, scope_filters, set_date, set_ids, set_text, status_filter, unsupported,
};

pub struct OrganizationScopedAdapter;

impl EndpointAdapter for OrganizationScopedAdapter {
    fn name(&self) -> &'static str {
        "organization_scoped"
    }

    fn plan(&self, invocation: &Invocation, ctx: &AdapterContext<'_>) -> Result<Plan> {
        let params = &invocation.params;
        let op = invocation.operation;

        // Users and the organization listing are not organization-owned.
        match (invocation.resource, op) {
            (Resource::User, Operation::GetCurrent) => {
                return Ok(Plan::call(ApiRequest::get("/users/me")));
            }
            (Resource::User, Operation::Get) => {
                let id = params.id("userId")?;
                return Ok(Plan::call(ApiRequest::get(format!("/users/{id}"))));
            }
            (Resource::User, op) if op != Operation::GetAll => return Err(unsupported(invocation)),
            (Resource::Organization, Operation::GetAll) => {
                return Ok(Plan::call(ApiRequest::get("/organizations")));
            }
            _ => {}
        }

        let org = ctx.organization_id.filter(|o| !o.trim().is_empty()).ok_or_else(|| {
            Error::Validation(
                "organization ID is required; use a credential bound to an organization".into(),
            )
        })?;
        path_segment("organizationId", org)?;
        let scoped = |path: &str| format!("/organizations/{org}/{path}");

        match invocation.resource {
            Resource::Organization => match op {
                Operation::Get => Ok(Plan::call(ApiRequest::get(format!("/organizations/{org}")))),
                _ => Err(unsupported(invocation)),
            },

            Resource::Project => match op {
                Operation::Get => {
                    let id = params.id("projectId")?;
                    Ok(Plan::call(ApiRequest::get(format!("/projects/{id}"))))
                }
                Operation::GetAll => {
                    let fields = params.section("additionalFields");
                    let mut query = Query::new();
                    status_filter(&mut query, &fields);
                    page(&mut query, &fields);
                    Ok(Plan::call(ApiRequest::get(scoped("projects")).with_query(query)))
                }
                Operation::Create => {
                    let fields = params.section("additionalFields");
                    let mut body = Body::new();
                    set_text(&mut body, "name", Some(params.required("name")?));
                    set_text(&mut body, "description", fields.text("description"));
                    if let Some(billable) = fields.flag("billable") {
                        body.insert("billable".into(), billable.into());
                    }
                    Ok(Plan::call(ApiRequest::post(scoped("projects"), body)))
                }
                Operation::Update => {
                    let id = params.id("projectId")?;
                    let fields = params.section("updateFields");
                    let mut body = Body::new();
                    set_text(&mut body, "name", fields.text("name"));
                    set_text(&mut body, "description", fields.present_text("description"));
                    set_text(&mut body, "status", fields.text("status"));
                    Ok(Plan::call(ApiRequest::put(format!("/projects/{id}"), body)))
                }
                Operation::Delete => delete(params, "projectId", "projects", org),
                _ => Err(unsupported(invocation)),
            },

            Resource::Activity => match op {
                Operation::GetAll => {
                    let fields = params.section("additionalFields");
                    let mut query = Query::new();
                    let endpoint = if fields.flag("useDaily").unwrap_or(false) {
                        required_range(&mut query, "date", params, format_date)?;
                        scoped("activities/daily")
                    } else {
                        required_range(&mut query, "time_slot", params, format_time_slot)?;
                        scoped("activities")
                    };
                    scope_filters(&mut query, &fields);
                    Ok(Plan::call(ApiRequest::get(endpoint).with_query(query)))
                }
                _ => Err(unsupported(invocation)),
            },

            Resource::TimeEntry => match op {
                Operation::GetAll => {
                    let mut query = Query::new();
                    required_range(&mut query, "date", params, format_date)?;
                    scope_filters(&mut query, &params.section("additionalFields"));
                    Ok(Plan::call(ApiRequest::get(scoped("timesheets")).with_query(query)))
                }
                _ => Err(unsupported(invocation)),
            },

            Resource::Screenshot => match op {
                Operation::GetAll => {
                    let mut query = Query::new();
                    required_range(&mut query, "time_slot", params, format_time_slot)?;
                    scope_filters(&mut query, &params.section("additionalFields"));
                    Ok(Plan::call(ApiRequest::get(scoped("screenshots")).with_query(query)))
                }
                _ => Err(unsupported(invocation)),
            },

            Resource::Application => tool_usages(invocation, org, "application"),
            Resource::Url => tool_usages(invocation, org, "url"),

            Resource::Member | Resource::User => match op {
                Operation::GetAll => {
                    let fields = params.section("additionalFields");
                    let mut query = Query::new();
                    if let Some(include) = fields.flag("includeRemoved") {
                        query.insert("include_removed", include);
                    }
                    page(&mut query, &fields);
                    Ok(Plan::call(ApiRequest::get(scoped("members")).with_query(query)))
                }
                Operation::Get if invocation.resource == Resource::Member => {
                    let id = params.id("memberId")?;
                    Ok(Plan::call(ApiRequest::get(scoped(&format!("members/{id}")))))
                }
                _ => Err(unsupported(invocation)),
            },

            Resource::Task => match op {
                Operation::Get => {
                    let id = params.id("taskId")?;
                    Ok(Plan::call(ApiRequest::get(format!("/tasks/{id}"))))
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
                        ApiRequest::get(format!("/projects/{project}/tasks")).with_query(query),
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
                        format!("/projects/{project}/tasks"),
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
                    Ok(Plan::call(ApiRequest::put(format!("/tasks/{id}"), body)))
                }
                Operation::Delete => delete(params, "taskId", "tasks", org),
                _ => Err(unsupported(invocation)),
            },

            Resource::Note => match op {
                Operation::Get => {
                    let id = params.id("noteId")?;
                    Ok(Plan::call(ApiRequest::get(format!("/notes/{id}"))))
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
                    Ok(Plan::call(ApiRequest::get(scoped("notes")).with_query(query)))
                }
                Operation::Create => {
                    let fields = params.section("additionalFields");
                    let mut body = Body::new();
                    set_text(&mut body, "description", Some(params.required("description")?));
                    set_text(&mut body, "user_id", fields.text("userId"));
                    set_text(&mut body, "project_id", fields.text("projectId"));
                    set_text(&mut body, "task_id", fields.text("taskId"));
                    Ok(Plan::call(ApiRequest::post(scoped("notes"), body)))
                }
                _ => Err(unsupported(invocation)),
            },

            Resource::Client => match op {
                Operation::Get => {
                    let id = params.id("clientId")?;
                    Ok(Plan::call(ApiRequest::get(format!("/clients/{id}"))))
                }
                Operation::GetAll => {
                    let filters = params.section("filters");
                    let mut query = Query::new();
                    status_filter(&mut query, &filters);
                    page(&mut query, &filters);
                    Ok(Plan::call(ApiRequest::get(scoped("clients")).with_query(query)))
                }
                Operation::Create => {
                    let fields = params.section("additionalFields");
                    let mut body = Body::new();
                    set_text(&mut body, "name", Some(params.required("name")?));
                    set_text(&mut body, "email", fields.text("email"));
                    set_text(&mut body, "phone", fields.text("phone"));
                    set_text(&mut body, "address", fields.text("address"));
                    set_text(&mut body, "description", fields.text("description"));
                    Ok(Plan::call(ApiRequest::post(scoped("clients"), body)))
                }
                Operation::Update => {
                    let id = params.id("clientId")?;
                    let fields = params.section("updateFields");
                    let mut body = Body::new();
                    set_text(&mut body, "name", fields.text("name"));
                    set_text(&mut body, "email", fields.text("email"));
                    set_text(&mut body, "phone", fields.text("phone"));
                    set_text(&mut body, "address", fields.text("address"));
                    set_text(&mut body, "description", fields.present_text("description"));
                    set_text(&mut body, "status", fields.text("status"));
                    Ok(Plan::call(ApiRequest::put(format!("/clients/{id}"), body)))
                }
                Operation::Delete => delete(params, "clientId", "clients", org),
                _ => Err(unsupported(invocation)),
            },

            Resource::Invoice => match op {
                Operation::Get => {
                    let id = params.id("invoiceId")?;
                    Ok(Plan::call(ApiRequest::get(format!("/client_invoices/{id}"))))
                }
                Operation::GetAll => {
                    let filters = params.section("filters");
                    let mut query = Query::new();
                    list_filter(&mut query, "client_ids", &filters, "clientId");
                    status_filter(&mut query, &filters);
                    optional_range(
                        &mut query,
                        "issue_date",
                        filters.text("startDate"),
                        filters.text("endDate"),
                        format_date,
                    )?;
                    if let Some(include) = filters.flag("includeLineItems") {
                        query.insert("include_line_items", include);
                    }
                    page(&mut query, &filters);
                    Ok(Plan::call(
                        ApiRequest::get(scoped("client_invoices")).with_query(query),
                    ))
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
                    Ok(Plan::call(ApiRequest::post(scoped("client_invoices"), body)))
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
                    Ok(Plan::call(ApiRequest::put(
                        format!("/client_invoices/{id}"),
                        body,
                    )))
                }
                Operation::Delete => delete(params, "invoiceId", "client_invoices", org),
                _ => Err(unsupported(invocation)),
            },

            Resource::Schedule => match op {
                Operation::Get => {
                    let id = params.id("scheduleId")?;
                    Ok(Plan::call(ApiRequest::get(format!(
                        "/attendance_schedules/{id}"
                    ))))
                }
                Operation::GetAll => {
                    let filters = params.section("filters");
                    let mut query = Query::new();
                    list_filter(&mut query, "user_ids", &filters, "userId");
                    optional_range(
                        &mut query,
                        "date",
                        filters.text("startDate"),
                        filters.text("endDate"),
                        format_date,
                    )?;
                    page(&mut query, &filters);
                    Ok(Plan::call(
                        ApiRequest::get(scoped("attendance_schedules")).with_query(query),
                    ))
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
                    set_text(&mut body, "repeat_schedule", fields.text("repeat"));
                    if let Some(days) = fields.list("weekdays") {
                        body.insert(
                            "weekdays".into(),
                            Value::Array(days.into_iter().map(Value::String).collect()),
                        );
                    }
                    Ok(Plan::call(ApiRequest::post(
                        scoped("attendance_schedules"),
                        body,
                    )))
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
                    Ok(Plan::call(ApiRequest::put(
                        format!("/attendance_schedules/{id}"),
                        body,
                    )))
                }
                Operation::Delete => {
                    delete(params, "scheduleId", "attendance_schedules", org)
                }
                _ => Err(unsupported(invocation)),
            },

            Resource::Todo => match op {
                Operation::Get => {
                    let id = params.id("todoId")?;
                    Ok(Plan::call(ApiRequest::get(format!("/global_todos/{id}"))))
                }
                Operation::GetAll => {
                    let filters = params.section("filters");
                    let mut query = Query::new();
                    list_filter(&mut query, "user_ids", &filters, "userId");
                    list_filter(&mut query, "project_ids", &filters, "projectId");
                    status_filter(&mut query, &filters);
                    page(&mut query, &filters);
                    Ok(Plan::call(
                        ApiRequest::get(scoped("global_todos")).with_query(query),
                    ))
                }
                Operation::Create => {
                    let fields = params.section("additionalFields");
                    let name = params
                        .text("name")
                        .or_else(|| params.text("title"))
                        .ok_or_else(|| {
                            Error::Validation("missing required parameter 'name'".into())
                        })?;
                    let mut body = Body::new();
                    set_text(&mut body, "name", Some(name));
                    set_text(&mut body, "description", fields.text("description"));
                    set_ids(
                        &mut body,
                        "project_ids",
                        fields.list("projectIds").or_else(|| fields.list("projectId")),
                    );
                    set_date(&mut body, "due_at", fields.text("dueAt"))?;
                    set_text(&mut body, "priority", fields.text("priority"));
                    Ok(Plan::call(ApiRequest::post(scoped("global_todos"), body)))
                }
                Operation::Update => {
                    let id = params.id("todoId")?;
                    let fields = params.section("updateFields");
                    let mut body = Body::new();
                    set_text(
                        &mut body,
                        "name",
                        fields.text("name").or_else(|| fields.text("title")),
                    );
                    set_text(&mut body, "description", fields.present_text("description"));
                    set_text(&mut body, "status", fields.text("status"));
                    set_ids(&mut body, "add_project_ids", fields.list("addProjectIds"));
                    set_ids(&mut body, "remove_project_ids", fields.list("removeProjectIds"));
                    set_date(&mut body, "due_at", fields.text("dueAt"))?;
                    set_text(&mut body, "priority", fields.text("priority"));
                    Ok(Plan::call(ApiRequest::put(format!("/global_todos/{id}"), body)))
                }
                Operation::Delete => delete(params, "todoId", "global_todos", org),
                _ => Err(unsupported(invocation)),
            },
        }
    }
}

fn delete(params: &Params, id_param: &str, collection: &str, org: &str) -> Result<Plan> {
    let id = params.id(id_param)?;
    Ok(Plan::acknowledged(
        ApiRequest::delete(format!("/{collection}/{id}")),
        delete_ack(id_param, &id, org),
    ))
}

/// Applications and URLs share one endpoint, told apart by `tool_type`.
fn tool_usages(invocation: &Invocation, org: &str, tool_type: &str) -> Result<Plan> {
    if invocation.operation != Operation::GetAll {
        return Err(unsupported(invocation));
    }
    let params = &invocation.params;
    let mut query = Query::new();
    query.insert("tool_type", tool_type);
    required_range(&mut query, "time_slot", params, format_time_slot)?;
    scope_filters(&mut query, &params.section("additionalFields"));
    Ok(Plan::call(
        ApiRequest::get(format!("/organizations/{org}/tool_usages")).with_query(query),
    ))
}
