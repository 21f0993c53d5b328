use crate::model::{AlertKey, AlertType, DailyForecastItem, WeatherAlertPreference, WeatherData};

/// The three built-in rules, all disabled.
pub fn default_alert_preferences() -> Vec<WeatherAlertPreference> {
    vec![
        WeatherAlertPreference {
            id: "rainTomorrow".to_string(),
            label: "Notify if rain is expected tomorrow".to_string(),
            key: AlertKey::RainTomorrow,
            kind: AlertType::Boolean,
            threshold: None,
            enabled: false,
        },
        WeatherAlertPreference {
            id: "tempAbove35".to_string(),
            label: "Notify if temperature goes above 35°C".to_string(),
            key: AlertKey::TempAbove,
            kind: AlertType::NumberGt,
            threshold: Some(35.0),
            enabled: false,
        },
        WeatherAlertPreference {
            id: "tempBelow5".to_string(),
            label: "Notify if temperature goes below 5°C".to_string(),
            key: AlertKey::TempBelow,
            kind: AlertType::NumberLt,
            threshold: Some(5.0),
            enabled: false,
        },
    ]
}

fn rains(day: &DailyForecastItem) -> bool {
    let code = day.condition_code.to_lowercase();
    code.contains("09")
        || code.contains("10")
        || code.contains("rain")
        || day.description.to_lowercase().contains("rain")
}

/// Messages for every enabled rule that fires, in preference order, without duplicates.
pub fn evaluate_alerts(prefs: &[WeatherAlertPreference], weather: &WeatherData) -> Vec<String> {
    let mut messages: Vec<String> = Vec::new();
    let mut push = |msg: String| {
        if !messages.contains(&msg) {
            messages.push(msg);
        }
    };

    let current = f64::from(weather.current.temp);

    for pref in prefs.iter().filter(|p| p.enabled) {
        match pref.key {
            AlertKey::RainTomorrow => {
                if let Some(tomorrow) = weather.daily.get(1).filter(|d| rains(d)) {
                    push(format!("Rain is expected tomorrow ({}).", tomorrow.description));
                }
            }
            AlertKey::TempAbove => {
                let Some(threshold) = pref.threshold else { continue };

                if current > threshold {
                    push(format!(
                        "Current temperature ({}°C) is above your alert threshold of {threshold}°C.",
                        weather.current.temp
                    ));
                }
                for day in weather.daily.iter().filter(|d| f64::from(d.high_temp) > threshold) {
                    push(format!(
                        "High temperature alert: {} will reach {}°C (threshold {threshold}°C).",
                        day.day_name, day.high_temp
                    ));
                }
            }
            AlertKey::TempBelow => {
                let Some(threshold) = pref.threshold else { continue };

                if current < threshold {
                    push(format!(
                        "Current temperature ({}°C) is below your alert threshold of {threshold}°C.",
                        weather.current.temp
                    ));
                }
                for day in weather.daily.iter().filter(|d| f64::from(d.low_temp) < threshold) {
                    push(format!(
                        "Low temperature alert: {} will drop to {}°C (threshold {threshold}°C).",
                        day.day_name, day.low_temp
                    ));
                }
            }
        }
    }

    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::mock_weather;
    use chrono::{Local, TimeZone};
    use rand::{SeedableRng, rngs::StdRng};

    fn weather() -> WeatherData {
        let now = Local.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap();
        let mut data = mock_weather(&mut StdRng::seed_from_u64(7), "Seville", now);

        data.current.temp = 20;
        for day in &mut data.daily {
            day.high_temp = 25;
            day.low_temp = 12;
            day.condition_code = "01d".into();
            day.description = "Clear Sky".into();
        }
        data
    }

    fn enabled() -> Vec<WeatherAlertPreference> {
        default_alert_preferences().into_iter().map(|p| WeatherAlertPreference { enabled: true, ..p }).collect()
    }

    #[test]
    fn defaults_are_disabled() {
        let prefs = default_alert_preferences();
        assert_eq!(prefs.len(), 3);
        assert!(prefs.iter().all(|p| !p.enabled));

        let mut data = weather();
        data.current.temp = 50;
        assert!(evaluate_alerts(&prefs, &data).is_empty());
    }

    #[test]
    fn calm_weather_raises_nothing() {
        assert!(evaluate_alerts(&enabled(), &weather()).is_empty());
    }

    #[test]
    fn rain_tomorrow_checks_second_day() {
        let mut data = weather();
        data.daily[0].condition_code = "10d".into();
        assert!(evaluate_alerts(&enabled(), &data).is_empty());

        data.daily[1].condition_code = "lightrain_day".into();
        data.daily[1].description = "Light Rain".into();
        assert_eq!(evaluate_alerts(&enabled(), &data), ["Rain is expected tomorrow (Light Rain)."]);
    }

    #[test]
    fn heat_alerts_cover_current_and_daily_highs() {
        let mut data = weather();
        data.current.temp = 36;
        data.daily[2].high_temp = 38;

        let alerts = evaluate_alerts(&enabled(), &data);
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0], "Current temperature (36°C) is above your alert threshold of 35°C.");
        assert!(alerts[1].contains(&data.daily[2].day_name));
        assert!(alerts[1].contains("38°C"));
    }

    #[test]
    fn cold_alerts_use_daily_lows() {
        let mut data = weather();
        data.daily[0].low_temp = 2;
        data.daily[3].low_temp = -4;

        let alerts = evaluate_alerts(&enabled(), &data);
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().all(|a| a.starts_with("Low temperature alert")));
    }

    #[test]
    fn duplicate_messages_are_collapsed() {
        let mut data = weather();
        data.current.temp = 40;
        let mut prefs = enabled();
        prefs.push(prefs[1].clone());

        let alerts = evaluate_alerts(&prefs, &data);
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn threshold_rules_without_threshold_are_skipped() {
        let mut data = weather();
        data.current.temp = 99;
        let prefs: Vec<_> = enabled().into_iter().map(|p| WeatherAlertPreference { threshold: None, ..p }).collect();

        assert!(evaluate_alerts(&prefs, &data).is_empty());
    }
}
