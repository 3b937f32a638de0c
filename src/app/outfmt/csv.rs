use std::{fs::File, io, path::PathBuf};

use crate::util::rw::WriteHandle;

use super::model::{CasWriter, OutputType};

enum Sink {
    Dir(PathBuf),
    Writer(WriteHandle),
}

/// Writes each table as CSV: either one file per table into a directory,
/// or everything to a single stream.
pub struct CsvWriter {
    sink: Sink,
}

impl CsvWriter {
    pub fn new(out_dir: &str) -> Result<CsvWriter, io::Error> {
        let dir_path = PathBuf::from(out_dir);
        std::fs::create_dir_all(&dir_path)?;
        Ok(CsvWriter {
            sink: Sink::Dir(dir_path),
        })
    }

    pub fn new_to_writer(w: WriteHandle) -> CsvWriter {
        CsvWriter {
            sink: Sink::Writer(w),
        }
    }

    fn write_table(
        &mut self,
        w: Box<dyn io::Write>,
        table_model: &crate::app::render::RenderTable,
    ) -> Result<(), super::model::Error> {
        let mut csv_w = csv::WriterBuilder::new()
            .has_headers(true)
            .from_writer(w);

        csv_w
            .write_record(&table_model.header)
            .map_err(|e| e.to_string())?;
        for row in &table_model.rows {
            csv_w.write_record(row).map_err(|e| e.to_string())?;
        }
        if !table_model.footer.is_empty() {
            csv_w
                .write_record(&table_model.footer)
                .map_err(|e| e.to_string())?;
        }

        let n_cols = table_model.header.len();
        for note in &table_model.notes {
            let mut note_record = Vec::<String>::with_capacity(n_cols);
            note_record.resize(n_cols, String::new());
            note_record[0] = note.clone();
            csv_w.write_record(note_record).map_err(|e| e.to_string())?;
        }

        csv_w.flush().map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl CasWriter for CsvWriter {
    fn print_render_table(
        &mut self,
        out_type: OutputType,
        name: &str,
        table_model: &crate::app::render::RenderTable,
    ) -> Result<(), super::model::Error> {
        let file_name = match out_type {
            OutputType::Holdings => "holdings.csv".to_string(),
            OutputType::Transactions => "transactions.csv".to_string(),
            OutputType::GainsSummary => "gains-summary.csv".to_string(),
            OutputType::GainsEntries => "gains.csv".to_string(),
            OutputType::Schedule112a => {
                format!("112a-{}.csv", name.to_lowercase())
            }
            OutputType::Raw => {
                format!("{}.csv", name.to_lowercase().replace(' ', "-"))
            }
        };

        let w: Box<dyn io::Write> = match &self.sink {
            Sink::Dir(dir) => {
                let file_path = dir.join(PathBuf::from(file_name));
                Box::new(File::create(file_path.clone()).map_err(|e| {
                    format!("Failed to create {:?}: {}", file_path.to_str(), e)
                })?)
            }
            Sink::Writer(handle) => Box::new(handle.clone()),
        };

        self.write_table(w, table_model)
    }
}

#[cfg(test)]
mod tests {
    use crate::app::outfmt::model::{CasWriter, OutputType};
    use crate::app::render::RenderTable;
    use crate::util::rw::WriteHandle;

    use super::CsvWriter;

    #[test]
    fn test_csv_writer_to_stream() {
        let (w, buff) = WriteHandle::string_buff_write_handle();
        let mut writer = CsvWriter::new_to_writer(w);

        let mut table = RenderTable::default();
        table.header = vec!["a".to_string(), "b".to_string()];
        table.rows.push(vec!["1".to_string(), "x,y".to_string()]);

        writer
            .print_render_table(OutputType::Raw, "t", &table)
            .unwrap();

        let out = buff.borrow().as_str().to_string();
        assert_eq!(out, "a,b\n1,\"x,y\"\n");
    }
}
