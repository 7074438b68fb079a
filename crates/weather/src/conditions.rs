//! WMO weather interpretation codes as reported by Open-Meteo.

/// Human-readable text for a weather code.
pub fn describe(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

/// Icon slug used by the front end. Unknown codes fall back to `clear-sky`.
pub fn icon(code: u8) -> &'static str {
    match code {
        1 => "mainly-clear",
        2 => "partly-cloudy",
        3 => "overcast",
        45 | 48 => "fog",
        51 | 56 | 61 | 66 | 80 => "light-rain",
        53 | 63 | 81 => "moderate-rain",
        55 | 57 | 65 | 67 | 82 => "heavy-rain",
        71 | 73 | 75 | 77 | 85 | 86 => "snow",
        95 | 96 | 99 => "thunderstorm",
        _ => "clear-sky",
    }
}
