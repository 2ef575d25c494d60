//! Service area command handlers.

use tabled::Tabled;

use servdesk_core::ServiceArea;

use crate::cli::{AreasArgs, AreasCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{Session, util};

#[derive(Tabled)]
struct AreaRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "City")]
    city: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Pincode")]
    pincode: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn row(a: &ServiceArea, color: bool) -> AreaRow {
    AreaRow {
        id: a.id.to_string(),
        name: a.name.clone(),
        city: a.city.clone(),
        state: output::opt_cell(a.state.as_deref()),
        pincode: a.pincode.clone(),
        status: output::active_cell(a.is_active, color),
    }
}

pub async fn handle(session: &Session, args: AreasArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AreasCommand::List { list } => {
            let page = session.page::<ServiceArea>();
            page.update_filters(|f| util::apply_list_args(f, &list, &[]))?;

            let view = util::load(&page, global).await?;
            let color = session.color;
            let out = output::render_list(
                global.output,
                &view.items,
                |a| row(a, color),
                |a| a.id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            util::print_footer(&view, global);
            Ok(())
        }

        AreasCommand::Toggle { id } => {
            super::toggle::<ServiceArea>(session, &id, global, |a| {
                let state = if a.is_active { "active" } else { "inactive" };
                format!("{} '{}' ({}) is now {state}", a.id, a.name, a.pincode)
            })
            .await
        }

        AreasCommand::Delete { id } => {
            super::delete::<ServiceArea>(session, &id, global, |a| {
                format!("'{}' ({}, {})", a.name, a.city, a.pincode)
            })
            .await
        }
    }
}
