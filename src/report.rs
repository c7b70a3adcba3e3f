// Live table: fixed-width rows of val/avg pairs with a repeating header.

use crate::models::{DiskReading, MetricsReport, NetworkReading};

pub const HEADER: &str = "
|        Network (MBytes/s)       | Disk Util |            Disk MBytes          |             Disk I/O            |
|     Received    |     Sent      |     %     |    MB/s Read    |  MB/s Written |     I/O Read    |   I/O Write   |
|   val  |   avg  |  val  |  avg  | val | avg |  val   |  avg   |  val  |  avg  |   val  |   avg  |  val  |  avg  |
| ------:| ------:| -----:| -----:| ---:| ---:| ------:| ------:| -----:| -----:| ------:| ------:| -----:| -----:|";

/// One table row. Utilization and op counts are truncated to whole numbers;
/// untracked sections print as zeros.
pub fn format_row(report: &MetricsReport) -> String {
    let net = report.network.unwrap_or_default();
    let disk = report.disk.unwrap_or_default();
    format!(
        "{} {} {} {} |",
        network_cells(&net),
        util_cells(&disk),
        throughput_cells(&disk),
        ops_cells(&disk)
    )
}

fn network_cells(net: &NetworkReading) -> String {
    format!(
        "| {:6.1} | {:6.1} | {:5.1} | {:5.1}",
        net.recv_mb_per_sec.val,
        net.recv_mb_per_sec.avg,
        net.sent_mb_per_sec.val,
        net.sent_mb_per_sec.avg
    )
}

fn util_cells(disk: &DiskReading) -> String {
    format!(
        "| {:3} | {:3}",
        disk.util_percent.val as i64, disk.util_percent.avg as i64
    )
}

fn throughput_cells(disk: &DiskReading) -> String {
    format!(
        "| {:6.1} | {:6.1} | {:5.1} | {:5.1}",
        disk.read_mb_per_sec.val,
        disk.read_mb_per_sec.avg,
        disk.writ_mb_per_sec.val,
        disk.writ_mb_per_sec.avg
    )
}

fn ops_cells(disk: &DiskReading) -> String {
    format!(
        "| {:6} | {:6} | {:5} | {:5}",
        disk.read_ops_per_sec.val as i64,
        disk.read_ops_per_sec.avg as i64,
        disk.writ_ops_per_sec.val as i64,
        disk.writ_ops_per_sec.avg as i64
    )
}

/// Tracks how many rows were printed so the header repeats every `header_every` rows.
#[derive(Debug)]
pub struct Table {
    header_every: usize,
    rows: usize,
}

impl Table {
    pub fn new(header_every: usize) -> Self {
        Self {
            header_every: header_every.max(1),
            rows: 0,
        }
    }

    /// Text to print for the next row, prefixed by the header when due.
    pub fn next_lines(&mut self, report: &MetricsReport) -> String {
        let row = format_row(report);
        let out = if self.rows % self.header_every == 0 {
            format!("{HEADER}\n{row}")
        } else {
            row
        };
        self.rows += 1;
        out
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Reading;

    fn reading(val: f64, avg: f64) -> Reading {
        Reading {
            val,
            avg,
            smoothed: val,
        }
    }

    #[test]
    fn empty_report_row_is_all_zeros() {
        let row = format_row(&MetricsReport::default());
        assert_eq!(
            row,
            "|    0.0 |    0.0 |   0.0 |   0.0 |   0 |   0 |    0.0 |    0.0 |   0.0 |   0.0 |      0 |      0 |     0 |     0 |"
        );
    }

    #[test]
    fn row_width_matches_header() {
        let row = format_row(&MetricsReport::default());
        let last_header_line = HEADER.lines().last().unwrap();
        assert_eq!(row.len(), last_header_line.len());
    }

    #[test]
    fn row_formats_and_truncates_values() {
        let report = MetricsReport {
            timestamp: 1,
            network: Some(NetworkReading {
                recv_mb_per_sec: reading(4.56, 3.51),
                sent_mb_per_sec: reading(0.12, 0.1),
            }),
            disk: Some(DiskReading {
                util_percent: reading(49.9, 2.2),
                read_mb_per_sec: reading(52.8, 1.1),
                writ_mb_per_sec: reading(0.0, 0.9),
                read_ops_per_sec: reading(211.7, 4.0),
                writ_ops_per_sec: reading(5.0, 18.3),
            }),
        };
        assert_eq!(
            format_row(&report),
            "|    4.6 |    3.5 |   0.1 |   0.1 |  49 |   2 |   52.8 |    1.1 |   0.0 |   0.9 |    211 |      4 |     5 |    18 |"
        );
    }

    #[test]
    fn header_repeats_every_n_rows() {
        let mut table = Table::new(3);
        let with_header: Vec<bool> = (0..7)
            .map(|_| table.next_lines(&MetricsReport::default()).contains("Network (MBytes/s)"))
            .collect();
        assert_eq!(
            with_header,
            vec![true, false, false, true, false, false, true]
        );
        assert_eq!(table.rows(), 7);
    }
}
