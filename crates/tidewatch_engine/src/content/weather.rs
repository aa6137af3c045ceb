use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tidewatch_core::escape_html;

/// Compass direction the wind blows from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindDirection {
    None,
    North,
    NorthNorthEast,
    NorthEast,
    EastNorthEast,
    East,
    EastSouthEast,
    SouthEast,
    SouthSouthEast,
    South,
    SouthSouthWest,
    SouthWest,
    WestSouthWest,
    West,
    WestNorthWest,
    NorthWest,
    NorthNorthWest,
}

const COMPASS: [WindDirection; 16] = [
    WindDirection::North,
    WindDirection::NorthNorthEast,
    WindDirection::NorthEast,
    WindDirection::EastNorthEast,
    WindDirection::East,
    WindDirection::EastSouthEast,
    WindDirection::SouthEast,
    WindDirection::SouthSouthEast,
    WindDirection::South,
    WindDirection::SouthSouthWest,
    WindDirection::SouthWest,
    WindDirection::WestSouthWest,
    WindDirection::West,
    WindDirection::WestNorthWest,
    WindDirection::NorthWest,
    WindDirection::NorthNorthWest,
];

impl WindDirection {
    /// Arrow pointing where the wind blows to.
    pub fn arrow(self) -> &'static str {
        match self {
            WindDirection::None => "↺",
            WindDirection::North => "↓",
            WindDirection::NorthNorthEast => "↓↙",
            WindDirection::NorthEast => "↙",
            WindDirection::EastNorthEast => "↙←",
            WindDirection::East => "←",
            WindDirection::EastSouthEast => "←↖",
            WindDirection::SouthEast => "↖",
            WindDirection::SouthSouthEast => "↖↑",
            WindDirection::South => "↑",
            WindDirection::SouthSouthWest => "↑↗",
            WindDirection::SouthWest => "↗",
            WindDirection::WestSouthWest => "↗→",
            WindDirection::West => "→",
            WindDirection::WestNorthWest => "→↘",
            WindDirection::NorthWest => "↘",
            WindDirection::NorthNorthWest => "↘↓",
        }
    }

    /// Nearest of the sixteen compass points; non-finite input is `None`.
    pub fn from_degrees(degrees: f64) -> Self {
        if !degrees.is_finite() {
            return WindDirection::None;
        }
        let normalized = degrees.rem_euclid(360.0);
        let index = ((normalized / 22.5).round() as usize) % COMPASS.len();
        COMPASS[index]
    }

    /// Parses compass abbreviations such as `N`, `NNE` or `WSW`.
    pub fn from_label(label: &str) -> Self {
        let upper = label.trim().to_ascii_uppercase();
        const LABELS: [&str; 16] = [
            "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW",
            "NW", "NNW",
        ];
        LABELS
            .iter()
            .position(|candidate| *candidate == upper)
            .map_or(WindDirection::None, |index| COMPASS[index])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourForecast {
    /// Offset in hours from the snapshot time.
    pub hour_index: u32,
    pub temperature: f64,
    #[serde(default)]
    pub felt_temperature: Option<f64>,
    /// Between 0 and 1.
    pub rain_probability: f64,
    /// Litres per square metre.
    pub rain_amount: f64,
    pub wind_direction: WindDirection,
    pub wind_speed: f64,
    #[serde(default)]
    pub gust_speed: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Hourly forecast of one weather service, taken at `date_time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub service: String,
    pub date_time: DateTime<Utc>,
    pub hours: Vec<HourForecast>,
}

impl WeatherSnapshot {
    pub(super) fn summary(&self, reaction: &str) -> String {
        format!("The Weather for “{reaction}” according to {}", self.service)
    }

    pub(super) fn plain_text(&self) -> String {
        let mut text = format!(
            "The Weather (according to {}) on {}\n\n",
            self.service,
            self.date_time.format("%Y-%m-%d %H:%M UTC")
        );
        for hour in &self.hours {
            text.push_str(&format!(
                "{}\t{} °C\t{}% ({} l/m²)\t{} {} km/h\t{}\n",
                self.hour_label(hour),
                hour.temperature,
                percent(hour.rain_probability),
                hour.rain_amount,
                hour.wind_direction.arrow(),
                hour.wind_speed,
                hour.description
            ));
        }
        text
    }

    /// Columns for optional measurements appear only when some hour has them.
    pub(super) fn html_text(&self) -> String {
        let show_felt = self.hours.iter().any(|hour| hour.felt_temperature.is_some());
        let show_gusts = self.hours.iter().any(|hour| hour.gust_speed.is_some());
        let show_humidity = self.hours.iter().any(|hour| hour.humidity.is_some());

        let mut html = String::from("<html><head><style type=\"text/css\">");
        html.push_str(".weather-states { display: table; } ");
        html.push_str(".hour-state, .header { display: table-row; } ");
        html.push_str(".hour-state > div, .header > div { display: table-cell; padding: 0em 0.5em; text-align: center; } ");
        html.push_str(".header > div { font-weight: bold; }");
        html.push_str("</style></head><body>");
        html.push_str(&format!(
            "<h1>The Weather (according to {}) on {}</h1>",
            escape_html(&self.service),
            self.date_time.format("%Y-%m-%d %H:%M UTC")
        ));
        html.push_str("<div class=\"weather-states\"><div class=\"header\">");
        let mut header = vec!["Time", "Temperature"];
        if show_felt {
            header.push("feels like");
        }
        header.extend(["Chance of Rain", "Amount", "Wind from", "Speed"]);
        if show_gusts {
            header.push("Gusts");
        }
        if show_humidity {
            header.push("Humidity");
        }
        header.extend(["Description", "Image"]);
        for title in header {
            html.push_str(&format!("<div>{title}</div>"));
        }
        html.push_str("</div>");

        for hour in &self.hours {
            html.push_str("<div class=\"hour-state\">");
            cell(&mut html, "time", &self.hour_label(hour));
            cell(&mut html, "temperature", &format!("{} °C", hour.temperature));
            if show_felt {
                let felt = hour
                    .felt_temperature
                    .map(|felt| format!("({felt} °C)"))
                    .unwrap_or_default();
                cell(&mut html, "felt-temperature", &felt);
            }
            cell(
                &mut html,
                "rain-probability",
                &format!("{}%", percent(hour.rain_probability)),
            );
            cell(&mut html, "rain-amount", &format!("{} l/m²", hour.rain_amount));
            cell(&mut html, "wind-direction", hour.wind_direction.arrow());
            cell(&mut html, "wind-speed", &format!("{} km/h", hour.wind_speed));
            if show_gusts {
                let gusts = hour
                    .gust_speed
                    .map(|gusts| format!("{gusts} km/h"))
                    .unwrap_or_default();
                cell(&mut html, "gust-speed", &gusts);
            }
            if show_humidity {
                let humidity = hour
                    .humidity
                    .map(|humidity| format!("{}%", percent(humidity)))
                    .unwrap_or_default();
                cell(&mut html, "humidity", &humidity);
            }
            cell(&mut html, "description", &hour.description);
            match &hour.image {
                Some(image) => html.push_str(&format!(
                    "<div class=\"image\"><img src=\"{}\"></div>",
                    escape_html(image)
                )),
                None => html.push_str("<div class=\"image\"></div>"),
            }
            html.push_str("</div>");
        }
        html.push_str("</div></body></html>");
        html
    }

    fn hour_label(&self, hour: &HourForecast) -> String {
        (self.date_time + Duration::hours(i64::from(hour.hour_index)))
            .format("%H:%M")
            .to_string()
    }
}

fn percent(fraction: f64) -> i64 {
    (fraction * 100.0).round() as i64
}

fn cell(html: &mut String, class: &str, text: &str) {
    html.push_str(&format!("<div class=\"{class}\">{}</div>", escape_html(text)));
}
