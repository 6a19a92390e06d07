// Prompt construction

/// Instructions sent to the remote model for one description
pub fn build_prompt(description: &str, scene_name: &str) -> String {
    format!(
        r#"You are an expert in creating mathematical animations using the Manim library.

Please generate Python code using Manim to create the following animation:

"{description}"

Requirements:
1. Use the latest Manim Community version syntax
2. Create a single Scene class named "{scene_name}" that inherits from Scene
3. Start with `from manim import *`
4. Add short comments explaining the code
5. Make the animation visually appealing with appropriate colors and timing
6. Ensure the code is complete and ready to run
7. If the description mentions 3D, use appropriate 3D objects and camera settings

Return ONLY the Python code without any additional text or explanations."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_scene_and_description() {
        let prompt = build_prompt("a red square", "ManimScene");
        assert!(prompt.contains("\"a red square\""));
        assert!(prompt.contains("named \"ManimScene\""));
        assert!(prompt.contains("from manim import *"));
    }
}
