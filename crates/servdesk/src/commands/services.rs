//! Service catalog command handlers.

use tabled::Tabled;

use servdesk_core::Service;
use servdesk_core::model::service::CATEGORY;

use crate::cli::{GlobalOpts, ServicesArgs, ServicesCommand};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

#[derive(Tabled)]
struct ServiceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Price")]
    price: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

fn row(s: &Service, color: bool) -> ServiceRow {
    ServiceRow {
        id: s.id.to_string(),
        name: s.name.clone(),
        category: output::opt_cell(s.category.as_deref()),
        price: format!("{:.2}", s.price),
        status: output::active_cell(s.is_active, color),
        updated: output::date_cell(s.updated_at.or(s.created_at)),
    }
}

fn describe(s: &Service) -> String {
    let state = if s.is_active { "active" } else { "inactive" };
    format!("{} '{}' is now {state}", s.id, s.name)
}

pub async fn handle(session: &Session, args: ServicesArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ServicesCommand::List { list, category } => {
            let page = session.page::<Service>();
            page.update_filters(|f| {
                util::apply_list_args(f, &list, &[(CATEGORY, category.as_deref())])
            })?;

            let view = util::load(&page, global).await?;
            let color = session.color;
            let out = output::render_list(
                global.output,
                &view.items,
                |s| row(s, color),
                |s| s.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            util::print_footer(&view, global);
            Ok(())
        }

        ServicesCommand::Toggle { id } => super::toggle::<Service>(session, &id, global, describe).await,

        ServicesCommand::Delete { id } => {
            super::delete::<Service>(session, &id, global, |s| format!("'{}'", s.name)).await
        }
    }
}
