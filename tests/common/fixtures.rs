#![allow(dead_code)]

//! XML export fixtures mirroring the source tracker's search-request
//! response shape.

/// A minimal export document for one issue.
pub fn issue_xml(project: &str, ordinal: u64) -> String {
    format!(
        r#"<rss version="0.92"><channel>
            <issue start="0" end="1" total="1"/>
            <item>
                <project>{project}</project>
                <key id="{ordinal}">{project}-{ordinal}</key>
                <summary>Issue {ordinal}</summary>
                <description>Body of issue {ordinal}</description>
                <created>Mon, 1 Jan 2018 10:00:00 +0000</created>
                <status>Open</status>
                <type>Bug</type>
                <priority>Major</priority>
            </item>
        </channel></rss>"#
    )
}

/// A discovery response: newest issue plus the reported total.
pub fn discovery_xml(project: &str, last: u64, total: u64) -> String {
    format!(
        r#"<rss version="0.92"><channel>
            <issue start="0" end="1" total="{total}"/>
            <item>
                <key id="1">{project}-{last}</key>
                <summary>Newest</summary>
            </item>
        </channel></rss>"#
    )
}

/// A channel with zero items, as returned for a malformed batch.
pub const EMPTY_CHANNEL: &str =
    r#"<rss version="0.92"><channel><issue start="0" end="0" total="0"/></channel></rss>"#;

/// A fully populated export document exercising every normalizer path:
/// comments, attachments, sub-tasks, parent, typed links, custom tags.
pub const RICH_ITEM: &str = r#"<rss version="0.92"><channel>
    <issue start="0" end="1" total="1"/>
    <item>
        <project>ABC</project>
        <key id="10005">ABC-5</key>
        <summary>Widget leaks memory</summary>
        <description>&lt;p&gt;It leaks. See [ABC-3](https://tracker.example/browse/ABC-3)&lt;/p&gt;</description>
        <environment>&lt;p&gt;Linux x86_64&lt;/p&gt;</environment>
        <created>Mon, 1 Jan 2018 10:00:00 +0000</created>
        <resolved>Tue, 2 Jan 2018 11:30:00 +0000</resolved>
        <status>Resolved</status>
        <resolution>Fixed</resolution>
        <type>Bug</type>
        <priority>Major</priority>
        <component>net</component>
        <version>1.0</version>
        <fixVersion>1.1</fixVersion>
        <assignee username="jdoe">John Doe</assignee>
        <reporter username="asmith">Anna Smith</reporter>
        <labels>
            <label>regression</label>
        </labels>
        <customfields>
            <customfield id="customfield_10002">
                <customfieldvalues>
                    <label>hot</label>
                </customfieldvalues>
            </customfield>
        </customfields>
        <comments>
            <comment author="jdoe" created="Mon, 1 Jan 2018 12:00:00 +0000">First comment</comment>
            <comment author="stranger" created="Mon, 1 Jan 2018 13:00:00 +0000">Second comment</comment>
        </comments>
        <attachments>
            <attachment id="44" name="heap.log" author="jdoe" created="Mon, 1 Jan 2018 14:00:00 +0000"/>
        </attachments>
        <subtasks>
            <subtask>ABC-6</subtask>
            <subtask>ABC-7</subtask>
        </subtasks>
        <parent>ABC-1</parent>
        <issuelinks>
            <issuelinktype>
                <name>Dependency</name>
                <outwardlinks description="depends on">
                    <issuelink><issuekey>ABC-2</issuekey></issuelink>
                </outwardlinks>
                <inwardlinks description="is depended on by">
                    <issuelink><issuekey>XYZ-9</issuekey></issuelink>
                </inwardlinks>
            </issuelinktype>
        </issuelinks>
    </item>
</channel></rss>"#;
