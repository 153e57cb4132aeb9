use clap::Args;

#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Document type of the view
    #[arg(long = "type", value_name = "TYPE")]
    pub doc_type: String,

    /// Current document title
    #[arg(long)]
    pub title: String,

    /// Whether the document defines the status field
    #[arg(long)]
    pub has_status_field: bool,

    /// Type the transition is restricted to (default: submit.required_type)
    #[arg(long, value_name = "TYPE", help_heading = "Transition Overrides")]
    pub required_type: Option<String>,

    /// Status to move to (default: submit.target_status)
    #[arg(long, value_name = "STATUS", help_heading = "Transition Overrides")]
    pub target_status: Option<String>,

    /// Title prefix to apply (default: submit.title_prefix)
    #[arg(long, value_name = "PREFIX", help_heading = "Transition Overrides")]
    pub title_prefix: Option<String>,

    /// Do not fail when the view type differs from the required type
    #[arg(long, help_heading = "Transition Overrides")]
    pub no_enforce_type: bool,
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only list documents whose path starts with this prefix
    #[arg(long, default_value = "/")]
    pub path: String,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Repository path of the new document
    #[arg(long)]
    pub path: String,

    /// Document title
    #[arg(long)]
    pub title: String,

    /// Document type (default: contract.doc_type)
    #[arg(long = "type", value_name = "TYPE")]
    pub doc_type: Option<String>,

    /// Create the document without a status field
    #[arg(long)]
    pub no_status_field: bool,
}

#[derive(Args, Debug)]
pub struct DocumentArgs {
    /// Id of the document to act on
    #[arg(value_name = "ID")]
    pub id: String,
}

#[derive(Args, Debug)]
pub struct ChangeStatusArgs {
    /// Path prefix selecting the documents
    #[arg(long)]
    pub path: String,

    /// Status to move to (default: change_status.target_status)
    #[arg(long, value_name = "STATUS")]
    pub target_status: Option<String>,

    /// Only change documents currently in this status
    #[arg(long, value_name = "STATUS")]
    pub only_if_current_status: Option<String>,

    /// Type the change is restricted to (default: change_status.required_type)
    #[arg(long, value_name = "TYPE")]
    pub required_type: Option<String>,

    /// Do not enforce the required type while planning
    #[arg(long)]
    pub no_enforce_type: bool,
}

#[derive(Args, Debug)]
pub struct ApprovePathArgs {
    /// Path prefix selecting the documents
    #[arg(long)]
    pub path: String,
}
