use std::io::Write;

use tabled::settings::{object::Rows, Alignment, Style};

use crate::{app::render::RenderTable, util::rw::WriteHandle};

use super::model::{CasWriter, OutputType};

pub struct TextWriter {
    w: WriteHandle,
}

impl TextWriter {
    pub fn new(w: WriteHandle) -> TextWriter {
        TextWriter { w }
    }
}

impl CasWriter for TextWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), super::model::Error> {
        let map_write_err = |e| format!("{e}");

        for err in &table_model.errors {
            writeln!(self.w, "[!] {}", err).map_err(map_write_err)?;
        }

        let title = match out_type {
            OutputType::Holdings => "Holdings".to_string(),
            OutputType::Transactions => format!("Transactions for {}", name),
            OutputType::GainsSummary => "Capital Gains Summary".to_string(),
            OutputType::GainsEntries => "Realized Gains".to_string(),
            OutputType::Schedule112a => format!("Schedule 112A ({})", name),
            OutputType::Raw => name.to_string(),
        };
        writeln!(self.w, "{}", title).map_err(map_write_err)?;

        let mut table_bldr = tabled::builder::Builder::default();
        table_bldr.push_record(
            table_model
                .header
                .iter()
                .map(|h| h.to_uppercase())
                .collect::<Vec<String>>(),
        );
        for row in &table_model.rows {
            table_bldr.push_record(row);
        }
        if !table_model.footer.is_empty() {
            table_bldr.push_record(table_model.footer.clone());
        }

        let mut table = table_bldr.build();
        table.with(Style::ascii());
        table.modify(Rows::first(), Alignment::center());

        writeln!(self.w, "{}", table).map_err(map_write_err)?;

        for note in &table_model.notes {
            writeln!(self.w, "{}", note).map_err(map_write_err)?;
        }
        writeln!(self.w).map_err(map_write_err)?;

        Ok(())
    }
}
