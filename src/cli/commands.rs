use crate::{
    cli::args::{ApprovePathArgs, ChangeStatusArgs, CreateArgs, ListArgs, PlanArgs},
    cli::{Args, Command},
    core::{
        config::{ConfigLoader, ContractflowConfig},
        document::{Document, DocumentHandle, SessionContext},
        lifecycle::ContractLifecycle,
        operations::{
            approve_in_path, OperationInput, APPROVE, CHANGE_STATUS_IN_PATH, REJECT,
            SUBMIT_FOR_APPROVAL,
        },
        planner::{plan as plan_transition, DocumentView, TransitionParams},
        repository::InMemoryRepository,
        session::CoreSession,
    },
    Result,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Listing entry printed by `list`.
#[derive(Serialize)]
struct DocumentSummary<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    doc_type: &'a str,
    path: &'a str,
    title: &'a str,
    status: Option<String>,
}

pub async fn execute(args: Args) -> Result<()> {
    let config = ConfigLoader::load_from_workspace(&args.workspace)?;
    let store_path = args.store_path();

    let command = match args.command {
        Command::Plan(plan_args) => return plan(plan_args, &config),
        command => command,
    };
    let persist = !matches!(command, Command::List(_));

    let repository = Arc::new(InMemoryRepository::load(&store_path)?);
    let lifecycle = ContractLifecycle::with_http_transport(config, repository.clone());
    let session = lifecycle.session(SessionContext::user(args.user));

    let output = run_command(command, &lifecycle, &session).await?;
    lifecycle.settle(&session).await;

    if persist {
        repository.write_to(&store_path).await?;
        tracing::debug!(store = %store_path.display(), "store written");
    }
    print_json(&output)
}

fn plan(args: PlanArgs, config: &ContractflowConfig) -> Result<()> {
    let defaults = &config.submit;
    let params = TransitionParams::new(
        args.required_type
            .unwrap_or_else(|| defaults.required_type.clone()),
        args.target_status
            .unwrap_or_else(|| defaults.target_status.clone()),
        args.title_prefix
            .unwrap_or_else(|| defaults.title_prefix.clone()),
        defaults.enforce_type && !args.no_enforce_type,
    );
    let view = DocumentView::new(args.doc_type, args.title, args.has_status_field);
    let patch = plan_transition(&view, &params)?;
    print_json(&serde_json::to_value(&patch)?)
}

async fn run_command(
    command: Command,
    lifecycle: &ContractLifecycle,
    session: &CoreSession,
) -> Result<Value> {
    let config = lifecycle.config();
    let operations = lifecycle.operations();
    let output = match command {
        Command::Plan(_) => unreachable!("plan is handled before the store is opened"),
        Command::List(ListArgs { path }) => {
            let documents = session.query(&path, false).await?;
            let status_field = config.contract.status_field.as_str();
            let summaries: Vec<DocumentSummary> = documents
                .iter()
                .map(|doc| DocumentSummary {
                    id: &doc.id,
                    doc_type: &doc.doc_type,
                    path: doc.path().unwrap_or_default(),
                    title: doc.title().unwrap_or_default(),
                    status: doc.read_field(status_field).ok().flatten(),
                })
                .collect();
            serde_json::to_value(summaries)?
        }
        Command::Create(CreateArgs {
            path,
            title,
            doc_type,
            no_status_field,
        }) => {
            let doc_type = doc_type.unwrap_or_else(|| config.contract.doc_type.clone());
            let mut document = Document::new(doc_type, path, title);
            if !no_status_field {
                document = document.with_empty_field(config.contract.status_field.as_str());
            }
            let created = session.create_document(document).await?;
            session.commit().await?;
            serde_json::to_value(created)?
        }
        Command::Submit(target) => {
            let document = session.get_document(&target.id).await?;
            let result = operations
                .run(SUBMIT_FOR_APPROVAL, session, OperationInput::Document(document), &Value::Null)
                .await?;
            serde_json::to_value(result.documents())?
        }
        Command::Approve(target) => {
            let document = session.get_document(&target.id).await?;
            let result = operations
                .run(APPROVE, session, OperationInput::Document(document), &Value::Null)
                .await?;
            serde_json::to_value(result.documents())?
        }
        Command::Reject(target) => {
            let document = session.get_document(&target.id).await?;
            let result = operations
                .run(REJECT, session, OperationInput::Document(document), &Value::Null)
                .await?;
            serde_json::to_value(result.documents())?
        }
        Command::ChangeStatus(change) => {
            let params = change_status_params(change);
            let result = operations
                .run(CHANGE_STATUS_IN_PATH, session, OperationInput::None, &params)
                .await?;
            serde_json::to_value(result.documents())?
        }
        Command::ApprovePath(ApprovePathArgs { path }) => {
            let approved = approve_in_path(
                session,
                &path,
                &config.contract.doc_type,
                &config.contract.status_field,
            )
            .await?;
            json!({ "approved": approved })
        }
    };
    Ok(output)
}

fn change_status_params(args: ChangeStatusArgs) -> Value {
    let mut params = Map::new();
    params.insert("path".to_string(), Value::String(args.path));
    if let Some(target) = args.target_status {
        params.insert("targetStatus".to_string(), Value::String(target));
    }
    if let Some(current) = args.only_if_current_status {
        params.insert("onlyIfCurrentStatus".to_string(), Value::String(current));
    }
    if let Some(required) = args.required_type {
        params.insert("requiredType".to_string(), Value::String(required));
    }
    if args.no_enforce_type {
        params.insert("enforceType".to_string(), Value::Bool(false));
    }
    Value::Object(params)
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
