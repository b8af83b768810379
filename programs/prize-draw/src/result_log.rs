use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::state::{InstantWinRecord, WinnerRecord};
use crate::utils::{format_pence, format_timestamp, parse_pence, parse_timestamp};

pub const WINNERS_CSV_HEADER: [&str; 5] = [
    "time",
    "competitionName",
    "round",
    "winnerName",
    "fundsCollectedAtDraw",
];

/// Append-only history of main-draw winners and instant wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultLog {
    winners: Vec<WinnerRecord>,
    instant_wins: Vec<InstantWinRecord>,
}

/// The columns a winner keeps once exported to CSV.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CsvWinnerRow {
    pub timestamp: i64,
    pub competition_name: String,
    pub round: u64,
    pub winner_name: String,
    pub funds_collected_at_draw: u64,
}

impl From<&WinnerRecord> for CsvWinnerRow {
    fn from(record: &WinnerRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            competition_name: record.competition_name.clone(),
            round: record.round,
            winner_name: record.winner_name.clone(),
            funds_collected_at_draw: record.funds_collected_at_draw,
        }
    }
}

impl ResultLog {
    pub fn new(winners: Vec<WinnerRecord>, instant_wins: Vec<InstantWinRecord>) -> Self {
        Self {
            winners,
            instant_wins,
        }
    }

    pub fn append_winner(&mut self, record: WinnerRecord) {
        self.winners.push(record);
    }

    pub fn append_instant_win(&mut self, record: InstantWinRecord) {
        self.instant_wins.push(record);
    }

    pub fn winners(&self) -> &[WinnerRecord] {
        &self.winners
    }

    pub fn instant_wins(&self) -> &[InstantWinRecord] {
        &self.instant_wins
    }

    /// Drops the winner history. Instant wins are kept.
    pub fn clear_winners(&mut self) {
        self.winners.clear();
    }

    /// Current lengths of both logs, for [`ResultLog::truncate`].
    pub(crate) fn mark(&self) -> (usize, usize) {
        (self.winners.len(), self.instant_wins.len())
    }

    /// Drops everything appended since `mark` was taken.
    pub(crate) fn truncate(&mut self, (winners, instant_wins): (usize, usize)) {
        self.winners.truncate(winners);
        self.instant_wins.truncate(instant_wins);
    }

    /// One header row then one row per winner in log order. Every field is
    /// double-quoted with embedded quotes doubled; rows end with `\n`.
    pub fn export_csv(&self) -> Result<String> {
        let mut csv = csv_row(WINNERS_CSV_HEADER.iter().map(|cell| cell.to_string()));
        for record in &self.winners {
            csv.push('\n');
            csv.push_str(&csv_row([
                format_timestamp(record.timestamp)?,
                record.competition_name.clone(),
                record.round.to_string(),
                record.winner_name.clone(),
                format_pence(record.funds_collected_at_draw),
            ]));
        }
        Ok(csv)
    }

    /// Parses text produced by [`ResultLog::export_csv`].
    pub fn read_csv(text: &str) -> Result<Vec<CsvWinnerRow>> {
        let mut rows = parse_csv(text)?.into_iter();

        let header = rows.next().ok_or(CompetitionError::MalformedCsv)?;
        require!(
            header.iter().map(String::as_str).eq(WINNERS_CSV_HEADER),
            CompetitionError::MalformedCsv
        );

        rows.map(|row| -> Result<CsvWinnerRow> {
            let [time, competition_name, round, winner_name, funds]: [String; 5] =
                row.try_into().map_err(|_| CompetitionError::MalformedCsv)?;
            Ok(CsvWinnerRow {
                timestamp: parse_timestamp(&time)?,
                competition_name,
                round: round.parse().map_err(|_| CompetitionError::MalformedCsv)?,
                winner_name,
                funds_collected_at_draw: parse_pence(&funds)
                    .map_err(|_| CompetitionError::MalformedCsv)?,
            })
        })
        .collect()
    }
}

fn csv_row(cells: impl IntoIterator<Item = String>) -> String {
    cells
        .into_iter()
        .map(|cell| format!("\"{}\"", cell.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

/// RFC 4180 reader: quoted fields may hold commas, doubled quotes and newlines.
fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => quoted = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            '"' => return err!(CompetitionError::MalformedCsv),
            _ => field.push(c),
        }
    }
    require!(!quoted, CompetitionError::MalformedCsv);
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winner(name: &str, competition: &str, round: u64, funds: u64) -> WinnerRecord {
        WinnerRecord {
            timestamp: 1_714_564_800_000 + round as i64,
            competition_id: "c1".to_string(),
            competition_name: competition.to_string(),
            winner_name: name.to_string(),
            round,
            funds_collected_at_draw: funds,
        }
    }

    #[test]
    fn exports_quoted_rows_in_log_order() {
        let mut log = ResultLog::default();
        log.append_winner(winner("Ann", "£500 Cash", 1, 100_000));
        log.append_winner(winner("Bob \"the Builder\"", "Car, red", 2, 250));

        let csv = log.export_csv().unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "\"time\",\"competitionName\",\"round\",\"winnerName\",\"fundsCollectedAtDraw\""
        );
        assert_eq!(
            lines[1],
            "\"2024-05-01T12:00:00.001Z\",\"£500 Cash\",\"1\",\"Ann\",\"1000.00\""
        );
        assert_eq!(
            lines[2],
            "\"2024-05-01T12:00:00.002Z\",\"Car, red\",\"2\",\"Bob \"\"the Builder\"\"\",\"2.50\""
        );
    }

    #[test]
    fn csv_reads_back_into_the_same_records() {
        let mut log = ResultLog::default();
        log.append_winner(winner("Ann", "£500 Cash", 1, 100_000));
        log.append_winner(winner("Bob \"B\", Jr", "Line\nBreak", 2, 7));
        log.append_winner(winner("Carol", "Holiday", 3, 300));

        let rows = ResultLog::read_csv(&log.export_csv().unwrap()).unwrap();
        let expected: Vec<CsvWinnerRow> = log.winners().iter().map(CsvWinnerRow::from).collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn truncate_drops_appends_after_mark() {
        let mut log = ResultLog::default();
        log.append_winner(winner("Ann", "Cash", 1, 100));
        let mark = log.mark();

        log.append_winner(winner("Ben", "Cash", 2, 100));
        log.append_instant_win(InstantWinRecord {
            timestamp: 3,
            competition_id: "c1".to_string(),
            buyer_name: "Ben".to_string(),
            prize: "Mug".to_string(),
            round: 2,
        });
        log.truncate(mark);

        assert_eq!(log.winners().len(), 1);
        assert_eq!(log.winners()[0].winner_name, "Ann");
        assert!(log.instant_wins().is_empty());
    }

    #[test]
    fn empty_log_exports_only_the_header() {
        let csv = ResultLog::default().export_csv().unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(ResultLog::read_csv(&csv).unwrap().is_empty());
    }

    #[test]
    fn rejects_foreign_csv() {
        assert!(ResultLog::read_csv("").is_err());
        assert!(ResultLog::read_csv("\"a\",\"b\"\n").is_err());
        assert!(ResultLog::read_csv("\"unterminated").is_err());
    }

    #[test]
    fn clearing_winners_keeps_instant_wins() {
        let mut log = ResultLog::default();
        log.append_winner(winner("Ann", "Cash", 1, 100));
        log.append_instant_win(InstantWinRecord {
            timestamp: 0,
            competition_id: "c1".to_string(),
            buyer_name: "Ben".to_string(),
            prize: "Mug".to_string(),
            round: 1,
        });

        log.clear_winners();
        assert!(log.winners().is_empty());
        assert_eq!(log.instant_wins().len(), 1);
    }
}
