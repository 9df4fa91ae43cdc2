/// Instructions to hand to a text-generation assistant together with the PDF.
pub const AI_PROMPT: &str = "\
Please analyze this PDF document and generate a bookmark TXT file for it. \
Organize the bookmarks in the following format:

Format 1 (recommended):
1|Chapter 1 Introduction|1
1|Chapter 2 Fundamentals|5
2|2.1 Basic Concepts|5
2|2.2 Key Theorems|8
1|Chapter 3 Advanced Topics|12
2|3.1 Advanced Concepts|12
3|3.1.1 Detailed Explanation|12
3|3.1.2 Worked Examples|15
1|Chapter 4 Summary|20

Format notes:
- One bookmark per line
- Format: level|title|page
- Levels start at 1; 1 is top level, 2 is second level, and so on
- Pages start at 1 and name the page the bookmark points to

Alternatively, use format 2 (every entry becomes a top-level bookmark):
Chapter 1 Introduction (1)
Chapter 2 Fundamentals (5)
Chapter 3 Advanced Topics (12)
Chapter 4 Summary (20)

Make sure to:
1. Identify the document structure and chapter levels correctly
2. Identify the starting page of every chapter accurately
3. Keep a logical hierarchy
4. Keep titles short and clear";

/// Starting point for a new bookmark file.
pub const BOOKMARK_TEMPLATE: &str = "\
1|Chapter 1 Introduction|1
1|Chapter 2 Fundamentals|5
2|2.1 Basic Concepts|5
2|2.2 Key Theorems|8
1|Chapter 3 Advanced Topics|12
2|3.1 Advanced Concepts|12
3|3.1.1 Detailed Explanation|12
3|3.1.2 Worked Examples|15
1|Chapter 4 Summary|20

# Bookmark format:
# One bookmark per line
# Format: level|title|page
# Levels start at 1; 1 is top level, 2 is second level, and so on
# Pages start at 1 and name the page the bookmark points to
#
# Or use format 2, one top-level bookmark per line:
# Chapter 1 Introduction (1)
# Chapter 2 Fundamentals (5)
#
# Or indent by two spaces per level (pages default to 1):
# Chapter 1 Introduction
#   1.1 Background
";
