//! Transaction command handlers.
//!
//! Transactions are filtered, sorted, and paginated by the server, so
//! every flag here ends up as a query parameter.

use tabled::Tabled;

use servdesk_core::Transaction;
use servdesk_core::model::transaction::PAYMENT_METHOD;

use crate::cli::{GlobalOpts, TransactionsArgs, TransactionsCommand};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

#[derive(Tabled)]
struct TransactionRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Reference")]
    reference: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

fn row(t: &Transaction) -> TransactionRow {
    TransactionRow {
        id: t.id.to_string(),
        reference: output::opt_cell(t.reference.as_deref()),
        customer: output::opt_cell(t.customer.as_deref()),
        amount: format!("{:.2}", t.amount),
        method: output::opt_cell(t.payment_method.as_deref()),
        status: t.status.to_string(),
        created: output::date_cell(t.created_at),
    }
}

pub async fn handle(
    session: &Session,
    args: TransactionsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        TransactionsCommand::List {
            list,
            payment_method,
            query,
        } => {
            let page = session.page::<Transaction>();
            page.update_filters(|f| {
                if let Some(ref q) = query {
                    f.apply_query(q);
                }
                util::apply_list_args(f, &list, &[(PAYMENT_METHOD, payment_method.as_deref())])
            })?;
            tracing::debug!(query = %page.filters().to_query_string(), "transaction criteria");

            let view = util::load(&page, global).await?;
            let out = output::render_list(
                global.output,
                &view.items,
                row,
                |t| t.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            util::print_footer(&view, global);
            Ok(())
        }
    }
}
