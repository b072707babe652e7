// Copyright Amazon Web Services, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

pub(crate) mod utils;

#[cfg(test)]
mod event_pattern_tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::Value;

    use tag_guard::commands::{COMPLETIONS, EVENT_PATTERN, SETTINGS};
    use tag_guard::utils::reader::Reader;
    use tag_guard::utils::writer::Writer;

    use crate::utils::{get_full_path_for_resource_file, CommandTestRunner, StatusCode};

    struct EventPatternTestRunner<'args> {
        settings: Option<&'args str>,
    }

    impl<'args> CommandTestRunner for EventPatternTestRunner<'args> {
        fn build_args(&self) -> Vec<String> {
            let mut args = vec![String::from(EVENT_PATTERN)];
            if let Some(settings) = self.settings {
                args.push(format!("--{}", SETTINGS.0));
                args.push(get_full_path_for_resource_file(&format!("resources/{settings}")));
            }
            args
        }
    }

    struct CompletionsTestRunner;

    impl CommandTestRunner for CompletionsTestRunner {
        fn build_args(&self) -> Vec<String> {
            vec![
                String::from(COMPLETIONS),
                String::from("--shell"),
                String::from("bash"),
            ]
        }
    }

    #[rstest]
    #[case(None)]
    #[case(Some("settings/hub.yaml"))]
    fn test_event_pattern(#[case] settings: Option<&str>) {
        let mut writer = Writer::default();
        let status_code = EventPatternTestRunner { settings }.run(&mut writer, &mut Reader::default());

        assert_eq!(StatusCode::SUCCESS, status_code);
        let pattern = serde_json::from_str::<Value>(&writer.stripped().unwrap()).unwrap();
        assert_eq!(pattern["detail-type"][0], "AWS API Call via CloudTrail");
        assert_eq!(pattern["source"].as_array().unwrap().len(), 6);
        assert_eq!(pattern["detail"]["eventName"][3], "AllocateAddress");
    }

    #[test]
    fn test_event_pattern_rejects_invalid_settings() {
        let mut writer = Writer::default();
        let status_code = EventPatternTestRunner {
            settings: Some("settings/invalid-spoke.yaml"),
        }
        .run(&mut writer, &mut Reader::default());

        assert_eq!(StatusCode::ERROR, status_code);
        let err = writer.err_to_stripped().unwrap();
        assert!(err.contains("hubEventBusArn"), "{err}");
    }

    #[test]
    fn test_completions_for_bash() {
        let mut writer = Writer::default();
        let status_code = CompletionsTestRunner.run(&mut writer, &mut Reader::default());

        assert_eq!(StatusCode::SUCCESS, status_code);
        let script = writer.stripped().unwrap();
        assert!(script.contains("tag-guard"));
        assert!(script.contains("event-pattern"));
    }
}
