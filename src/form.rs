use std::collections::VecDeque;

use crate::error::FormError;
use crate::live::LiveSnapshot;
use crate::model::WinProbability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    BattingTeam,
    BowlingTeam,
    Venue,
    TossWinner,
    TossDecision,
    Innings,
    Target,
    Runs,
    Overs,
    Wickets,
}

impl FormField {
    pub fn label(self) -> &'static str {
        match self {
            FormField::BattingTeam => "Batting team",
            FormField::BowlingTeam => "Bowling team",
            FormField::Venue => "Venue",
            FormField::TossWinner => "Toss winner",
            FormField::TossDecision => "Toss decision",
            FormField::Innings => "Innings",
            FormField::Target => "Target runs",
            FormField::Runs => "Runs scored so far",
            FormField::Overs => "Overs completed",
            FormField::Wickets => "Wickets lost so far",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            FormField::Target | FormField::Runs | FormField::Overs | FormField::Wickets
        )
    }
}

pub const TOSS_DECISIONS: [&str; 2] = ["bat", "field"];

#[derive(Debug, Clone, PartialEq)]
pub struct ResultView {
    pub batting_team: String,
    pub bowling_team: String,
    pub probability: WinProbability,
    pub overridden: bool,
}

/// State of the prediction form. Option lists are derived from the current selections, so the
/// bowling side never offers the batting team and the toss winner is one of the two sides.
#[derive(Debug, Clone)]
pub struct FormState {
    teams: Vec<String>,
    venues: Vec<String>,
    batting: usize,
    bowling: usize,
    venue: usize,
    toss_winner: usize,
    toss_decision: usize,
    pub innings: u8,
    pub target_input: String,
    pub runs_input: String,
    pub overs_input: String,
    pub wickets_input: String,
    pub focus: usize,
    pub result: Option<ResultView>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl FormState {
    pub fn new(teams: Vec<String>, venues: Vec<String>) -> Self {
        Self {
            teams,
            venues,
            batting: 0,
            bowling: 0,
            venue: 0,
            toss_winner: 0,
            toss_decision: 0,
            innings: 1,
            target_input: "1".to_string(),
            runs_input: "0".to_string(),
            overs_input: "0.0".to_string(),
            wickets_input: "0".to_string(),
            focus: 0,
            result: None,
            logs: VecDeque::new(),
            help_overlay: false,
        }
    }

    pub fn fields(&self) -> Vec<FormField> {
        let mut out = vec![
            FormField::BattingTeam,
            FormField::BowlingTeam,
            FormField::Venue,
            FormField::TossWinner,
            FormField::TossDecision,
            FormField::Innings,
        ];
        if self.innings == 2 {
            out.push(FormField::Target);
        }
        out.extend([FormField::Runs, FormField::Overs, FormField::Wickets]);
        out
    }

    pub fn focused(&self) -> FormField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn select_next(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + 1) % len;
    }

    pub fn select_prev(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    pub fn batting_team(&self) -> Option<&str> {
        self.teams.get(self.batting).map(String::as_str)
    }

    pub fn bowling_options(&self) -> Vec<&str> {
        let batting = self.batting_team();
        self.teams
            .iter()
            .map(String::as_str)
            .filter(|t| Some(*t) != batting)
            .collect()
    }

    pub fn bowling_team(&self) -> Option<&str> {
        let options = self.bowling_options();
        options.get(self.bowling.min(options.len().saturating_sub(1))).copied()
    }

    pub fn venue(&self) -> Option<&str> {
        self.venues.get(self.venue).map(String::as_str)
    }

    pub fn toss_options(&self) -> Vec<&str> {
        [self.batting_team(), self.bowling_team()]
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn toss_winner(&self) -> Option<&str> {
        self.toss_options().get(self.toss_winner).copied()
    }

    pub fn toss_decision(&self) -> &'static str {
        TOSS_DECISIONS[self.toss_decision % TOSS_DECISIONS.len()]
    }

    /// Text shown for a field in the form.
    pub fn display_value(&self, field: FormField) -> String {
        match field {
            FormField::BattingTeam => self.batting_team().unwrap_or("-").to_string(),
            FormField::BowlingTeam => self.bowling_team().unwrap_or("-").to_string(),
            FormField::Venue => self.venue().unwrap_or("-").to_string(),
            FormField::TossWinner => self.toss_winner().unwrap_or("-").to_string(),
            FormField::TossDecision => self.toss_decision().to_string(),
            FormField::Innings => self.innings.to_string(),
            FormField::Target => self.target_input.clone(),
            FormField::Runs => self.runs_input.clone(),
            FormField::Overs => self.overs_input.clone(),
            FormField::Wickets => self.wickets_input.clone(),
        }
    }

    /// Left/right on a choice field.
    pub fn cycle(&mut self, forward: bool) {
        fn step(idx: usize, len: usize, forward: bool) -> usize {
            if len == 0 {
                return 0;
            }
            if forward {
                (idx + 1) % len
            } else {
                (idx + len - 1) % len
            }
        }

        match self.focused() {
            FormField::BattingTeam => {
                self.batting = step(self.batting, self.teams.len(), forward);
                let len = self.bowling_options().len();
                self.bowling = self.bowling.min(len.saturating_sub(1));
            }
            FormField::BowlingTeam => {
                self.bowling = step(self.bowling, self.bowling_options().len(), forward);
            }
            FormField::Venue => self.venue = step(self.venue, self.venues.len(), forward),
            FormField::TossWinner => {
                self.toss_winner = step(self.toss_winner, self.toss_options().len(), forward);
            }
            FormField::TossDecision => {
                self.toss_decision = step(self.toss_decision, TOSS_DECISIONS.len(), forward);
            }
            FormField::Innings => {
                self.innings = if self.innings == 1 { 2 } else { 1 };
            }
            _ => {}
        }
    }

    pub fn type_char(&mut self, c: char) {
        let field = self.focused();
        let allow_dot = field == FormField::Overs;
        let Some(input) = self.input_mut(field) else {
            return;
        };
        // Overs take a single ball digit after the point.
        let ball_digit_taken = input.split_once('.').is_some_and(|(_, balls)| !balls.is_empty());
        if (c.is_ascii_digit() && !ball_digit_taken)
            || (allow_dot && c == '.' && !input.contains('.'))
        {
            if input == "0" && c != '.' {
                input.clear();
            }
            input.push(c);
        }
    }

    pub fn backspace(&mut self) {
        let field = self.focused();
        if let Some(input) = self.input_mut(field) {
            input.pop();
        }
    }

    fn input_mut(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Target => Some(&mut self.target_input),
            FormField::Runs => Some(&mut self.runs_input),
            FormField::Overs => Some(&mut self.overs_input),
            FormField::Wickets => Some(&mut self.wickets_input),
            _ => None,
        }
    }

    pub fn to_snapshot(&self) -> Result<LiveSnapshot, FormError> {
        let (Some(batting), Some(bowling), Some(toss_winner)) =
            (self.batting_team(), self.bowling_team(), self.toss_winner())
        else {
            return Err(FormError::NoTeams);
        };
        let target_runs = if self.innings == 2 {
            Some(parse_number::<u32>("Target runs", &self.target_input)?)
        } else {
            None
        };
        Ok(LiveSnapshot {
            batting_team: batting.to_string(),
            bowling_team: bowling.to_string(),
            venue: self.venue().unwrap_or_default().to_string(),
            toss_winner: toss_winner.to_string(),
            toss_decision: self.toss_decision().to_string(),
            innings: self.innings,
            target_runs,
            runs_so_far: parse_number("Runs", &self.runs_input)?,
            overs: parse_number("Overs", &self.overs_input)?,
            wickets_so_far: parse_number("Wickets", &self.wickets_input)?,
        })
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

fn parse_number<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, FormError> {
    raw.trim().parse::<T>().map_err(|_| FormError::InvalidNumber {
        field,
        raw: raw.to_string(),
    })
}
