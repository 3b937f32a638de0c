use crate::app::render::RenderTable;

pub enum OutputType {
    Holdings,
    Transactions,
    GainsSummary,
    GainsEntries,
    Schedule112a,
    Raw,
}

pub type Error = String;

pub trait CasWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &RenderTable,
    ) -> Result<(), Error>;

    fn finish(self: Box<Self>) -> Result<(), Error> {
        Ok(())
    }
}
